//! Configuration types for reel-relay
//!
//! Every tunable of a run lives here with a documented default. There is no
//! configuration file: [`Config::from_env`] overlays `REEL_RELAY_*` environment
//! variables (plus `FLIC_TOKEN`) on top of [`Config::default`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr, time::Duration};

/// Search-surface settings used by link discovery
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Site the search is scoped to (default: "instagram.com")
    #[serde(default = "default_platform_scope")]
    pub platform_scope: String,

    /// Tag appended to the query to favour short-form posts (default: "reel")
    #[serde(default = "default_content_tag")]
    pub content_tag: String,

    /// Path segment a result link must contain to count as a post (default: "reel")
    #[serde(default = "default_content_tag")]
    pub link_marker: String,

    /// Search results page the query is appended to (default: Google)
    #[serde(default = "default_search_page")]
    pub search_page_url: String,

    /// CSS selector for result anchors (default: "div.MjjYud a")
    #[serde(default = "default_result_selector")]
    pub result_selector: String,

    /// Upper bound on waiting for the result container to render (default: 10 seconds)
    #[serde(default = "default_result_wait", with = "duration_serde")]
    pub result_wait: Duration,

    /// Base URL of the Browserless-compatible rendering service
    #[serde(default = "default_browserless_url")]
    pub browserless_url: String,

    /// Optional API token for the rendering service
    #[serde(default)]
    pub browserless_token: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            platform_scope: default_platform_scope(),
            content_tag: default_content_tag(),
            link_marker: default_content_tag(),
            search_page_url: default_search_page(),
            result_selector: default_result_selector(),
            result_wait: default_result_wait(),
            browserless_url: default_browserless_url(),
            browserless_token: None,
        }
    }
}

/// Media retrieval settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloads land in, created if absent (default: "./instagram_videos")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Platform label used in file names (default: "instagram")
    #[serde(default = "default_platform_label")]
    pub platform_label: String,

    /// Maximum number of posts to discover and download per run (default: 5)
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,

    /// Path to the yt-dlp executable (auto-detected on PATH if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            platform_label: default_platform_label(),
            max_videos: default_max_videos(),
            ytdlp_path: None,
        }
    }
}

/// Remote publishing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Base URL of the SocialVerse API (default: "https://api.socialverseapp.com")
    #[serde(default = "default_api_base")]
    pub api_base_url: String,

    /// Value of the `Flic-Token` header (required)
    #[serde(default)]
    pub flic_token: String,

    /// Category every post is registered under (default: 25)
    #[serde(default = "default_category_id")]
    pub category_id: u32,

    /// Title template; `{keyword}` is replaced with the search keyword
    #[serde(default = "default_title_template")]
    pub title_template: String,

    /// Read size used while fingerprinting (default: 4096 bytes)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Bound on establishing a connection to the API or upload host
    /// (default: 30 seconds). Requests themselves, including the streamed
    /// upload body, are never cut off.
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            flic_token: String::new(),
            category_id: default_category_id(),
            title_template: default_title_template(),
            chunk_size: default_chunk_size(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl UploadConfig {
    /// Render the post title for a keyword
    pub fn title_for(&self, keyword: &str) -> String {
        self.title_template.replace("{keyword}", keyword)
    }
}

/// Retry policy for the discovery + download phase
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of discovery + download attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (default: 3 seconds)
    #[serde(default = "default_backoff", with = "duration_serde")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Main configuration for a reel-relay run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search-surface settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Media retrieval settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Remote publishing settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Discovery retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Build a config from defaults overlaid with process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults overlaid with values from `lookup`
    ///
    /// Recognised keys:
    ///
    /// | key | field |
    /// |-----|-------|
    /// | `FLIC_TOKEN` / `REEL_RELAY_FLIC_TOKEN` | `upload.flic_token` |
    /// | `REEL_RELAY_API_BASE` | `upload.api_base_url` |
    /// | `REEL_RELAY_CATEGORY_ID` | `upload.category_id` |
    /// | `REEL_RELAY_DOWNLOAD_DIR` | `download.download_dir` |
    /// | `REEL_RELAY_MAX_VIDEOS` | `download.max_videos` |
    /// | `REEL_RELAY_YTDLP_PATH` | `download.ytdlp_path` |
    /// | `REEL_RELAY_BROWSERLESS_URL` | `search.browserless_url` |
    /// | `REEL_RELAY_BROWSERLESS_TOKEN` | `search.browserless_token` |
    /// | `REEL_RELAY_RESULT_WAIT_SECS` | `search.result_wait` |
    /// | `REEL_RELAY_RETRY_ATTEMPTS` | `retry.max_attempts` |
    /// | `REEL_RELAY_RETRY_BACKOFF_SECS` | `retry.backoff` |
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(token) = get("REEL_RELAY_FLIC_TOKEN").or_else(|| get("FLIC_TOKEN")) {
            config.upload.flic_token = token;
        }
        if let Some(base) = get("REEL_RELAY_API_BASE") {
            config.upload.api_base_url = base;
        }
        if let Some(raw) = get("REEL_RELAY_CATEGORY_ID") {
            config.upload.category_id = parse_value("REEL_RELAY_CATEGORY_ID", &raw)?;
        }
        if let Some(dir) = get("REEL_RELAY_DOWNLOAD_DIR") {
            config.download.download_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("REEL_RELAY_MAX_VIDEOS") {
            config.download.max_videos = parse_value("REEL_RELAY_MAX_VIDEOS", &raw)?;
        }
        if let Some(path) = get("REEL_RELAY_YTDLP_PATH") {
            config.download.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(url) = get("REEL_RELAY_BROWSERLESS_URL") {
            config.search.browserless_url = url;
        }
        if let Some(token) = get("REEL_RELAY_BROWSERLESS_TOKEN") {
            config.search.browserless_token = Some(token);
        }
        if let Some(raw) = get("REEL_RELAY_RESULT_WAIT_SECS") {
            config.search.result_wait =
                Duration::from_secs(parse_value("REEL_RELAY_RESULT_WAIT_SECS", &raw)?);
        }
        if let Some(raw) = get("REEL_RELAY_RETRY_ATTEMPTS") {
            config.retry.max_attempts = parse_value("REEL_RELAY_RETRY_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = get("REEL_RELAY_RETRY_BACKOFF_SECS") {
            config.retry.backoff =
                Duration::from_secs(parse_value("REEL_RELAY_RETRY_BACKOFF_SECS", &raw)?);
        }

        Ok(config)
    }

    /// Check the settings a run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.upload.flic_token.trim().is_empty() {
            return Err(Error::config(
                "upload.flic_token",
                "a Flic token is required (set FLIC_TOKEN)",
            ));
        }
        if self.download.max_videos == 0 {
            return Err(Error::config(
                "download.max_videos",
                "max_videos must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "max_attempts must be at least 1",
            ));
        }
        if self.upload.chunk_size == 0 {
            return Err(Error::config(
                "upload.chunk_size",
                "chunk_size must be at least 1 byte",
            ));
        }
        for (key, value) in [
            ("upload.api_base_url", &self.upload.api_base_url),
            ("search.search_page_url", &self.search.search_page_url),
            ("search.browserless_url", &self.search.browserless_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL {value:?}: {e}")))?;
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(key, format!("cannot parse {raw:?}: {e}")))
}

fn default_platform_scope() -> String {
    "instagram.com".into()
}

fn default_content_tag() -> String {
    "reel".into()
}

fn default_search_page() -> String {
    "https://www.google.com/search".into()
}

fn default_result_selector() -> String {
    "div.MjjYud a".into()
}

fn default_result_wait() -> Duration {
    Duration::from_secs(10)
}

fn default_browserless_url() -> String {
    "http://localhost:3000".into()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./instagram_videos")
}

fn default_platform_label() -> String {
    "instagram".into()
}

fn default_max_videos() -> usize {
    5
}

fn default_api_base() -> String {
    "https://api.socialverseapp.com".into()
}

fn default_category_id() -> u32 {
    25
}

fn default_title_template() -> String {
    "Instagram Reel: {keyword}".into()
}

fn default_chunk_size() -> usize {
    4096
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_secs(3)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.download.max_videos, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff, Duration::from_secs(3));
        assert_eq!(config.search.result_wait, Duration::from_secs(10));
        assert_eq!(config.upload.category_id, 25);
        assert_eq!(config.upload.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.upload.chunk_size, 4096);
        assert_eq!(config.search.platform_scope, "instagram.com");
        assert_eq!(config.search.link_marker, "reel");
    }

    #[test]
    fn lookup_overlays_environment_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("FLIC_TOKEN", "flic_abc"),
            ("REEL_RELAY_MAX_VIDEOS", "2"),
            ("REEL_RELAY_RETRY_BACKOFF_SECS", "0"),
            ("REEL_RELAY_DOWNLOAD_DIR", "/tmp/reels"),
            ("REEL_RELAY_BROWSERLESS_TOKEN", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.upload.flic_token, "flic_abc");
        assert_eq!(config.download.max_videos, 2);
        assert_eq!(config.retry.backoff, Duration::ZERO);
        assert_eq!(config.download.download_dir, PathBuf::from("/tmp/reels"));
        assert_eq!(config.search.browserless_token.as_deref(), Some("secret"));
        assert_eq!(config.retry.max_attempts, 3, "untouched keys keep defaults");
    }

    #[test]
    fn prefixed_token_wins_over_plain_token() {
        let config = Config::from_lookup(lookup_from(&[
            ("FLIC_TOKEN", "plain"),
            ("REEL_RELAY_FLIC_TOKEN", "prefixed"),
        ]))
        .unwrap();
        assert_eq!(config.upload.flic_token, "prefixed");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config =
            Config::from_lookup(lookup_from(&[("REEL_RELAY_MAX_VIDEOS", "  ")])).unwrap();
        assert_eq!(config.download.max_videos, 5);
    }

    #[test]
    fn unparseable_number_names_the_key() {
        let err = Config::from_lookup(lookup_from(&[("REEL_RELAY_RETRY_ATTEMPTS", "three")]))
            .unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("REEL_RELAY_RETRY_ATTEMPTS"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validate_requires_token() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "upload.flic_token"));
    }

    #[test]
    fn validate_rejects_zero_attempts_and_zero_videos() {
        let mut config = Config::default();
        config.upload.flic_token = "t".into();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        config.retry.max_attempts = 1;
        config.download.max_videos = 0;
        assert!(config.validate().is_err());

        config.download.max_videos = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_api_base() {
        let mut config = Config::default();
        config.upload.flic_token = "t".into();
        config.upload.api_base_url = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid URL"));
    }

    #[test]
    fn title_template_substitutes_keyword() {
        let upload = UploadConfig::default();
        assert_eq!(upload.title_for("sunset"), "Instagram Reel: sunset");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "retry": { "max_attempts": 7 }, "upload": { "flic_token": "x" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.retry.backoff, Duration::from_secs(3));
        assert_eq!(config.upload.flic_token, "x");
        assert_eq!(config.download.max_videos, 5);
    }

    #[test]
    fn duration_serde_serializes_as_seconds() {
        let retry = RetryConfig {
            max_attempts: 1,
            backoff: Duration::from_secs(42),
        };
        let json = serde_json::to_value(&retry).unwrap();
        assert_eq!(json["backoff"], 42);
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        // SAFETY: serialised with other env-mutating tests
        unsafe {
            std::env::set_var("REEL_RELAY_FLIC_TOKEN", "from-env");
            std::env::set_var("REEL_RELAY_CATEGORY_ID", "31");
        }
        let config = Config::from_env();
        unsafe {
            std::env::remove_var("REEL_RELAY_FLIC_TOKEN");
            std::env::remove_var("REEL_RELAY_CATEGORY_ID");
        }

        let config = config.unwrap();
        assert_eq!(config.upload.flic_token, "from-env");
        assert_eq!(config.upload.category_id, 31);
    }
}
