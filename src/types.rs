//! Core types for reel-relay

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap()
});

/// Search query scoped to a platform and content tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text keyword entered by the user
    pub keyword: String,
    /// Site the search is restricted to (e.g. "instagram.com")
    pub platform_scope: String,
    /// Tag that biases results towards short-form posts (e.g. "reel")
    pub content_tag: String,
}

impl SearchQuery {
    /// Create a query for `keyword`
    pub fn new(
        keyword: impl Into<String>,
        platform_scope: impl Into<String>,
        content_tag: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            platform_scope: platform_scope.into(),
            content_tag: content_tag.into(),
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "site:{} {} {}",
            self.platform_scope,
            self.keyword.trim(),
            self.content_tag
        )
    }
}

/// A search result link that points at a post
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateLink {
    /// Absolute URL of the post
    pub url: String,
}

impl CandidateLink {
    /// Accept `url` only if it is an absolute http(s) URL whose path contains
    /// the `marker` segment (e.g. `/reel/`)
    pub fn parse(url: &str, marker: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let has_marker = parsed
            .path_segments()
            .is_some_and(|mut segments| segments.any(|s| s == marker));
        has_marker.then(|| Self {
            url: url.to_string(),
        })
    }
}

impl fmt::Display for CandidateLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Platform identifier of a single post
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostReference {
    /// Short identifier embedded in the post URL
    pub shortcode: String,
}

impl PostReference {
    /// Extract the shortcode from a link
    ///
    /// The shortcode is the path segment that follows the `marker` segment, i.e.
    /// the component before the trailing slash of `/reel/{shortcode}/`. Returns
    /// `None` when the marker is the last segment or the candidate segment
    /// contains characters a shortcode never has.
    pub fn from_link(link: &CandidateLink, marker: &str) -> Option<Self> {
        let parsed = url::Url::parse(&link.url).ok()?;
        let mut segments = parsed.path_segments()?;
        segments.find(|s| *s == marker)?;
        let shortcode = segments.next()?;
        SHORTCODE_RE.is_match(shortcode).then(|| Self {
            shortcode: shortcode.to_string(),
        })
    }
}

impl fmt::Display for PostReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shortcode)
    }
}

/// A media file on local disk, verified to exist and be non-empty
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedMedia {
    /// Final location of the file
    pub local_path: PathBuf,
    /// 1-based position of the source link in discovery order
    pub index: usize,
    /// Post the file was retrieved from
    pub source: PostReference,
}

/// Lower-case hex SHA-256 digest of a file's full content
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(pub String);

impl ContentFingerprint {
    /// The digest as hex text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-use destination for one direct file transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSlot {
    /// Pre-signed URL the file bytes are PUT to
    pub target_url: String,
    /// Fingerprint the server associated with the slot
    pub fingerprint: ContentFingerprint,
}

/// Feed visibility of a registered post
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Not shown in the public feed
    #[default]
    Private,
    /// Shown in the public feed
    Public,
}

impl Visibility {
    /// Value of the `is_available_in_public_feed` flag
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Post created on the remote platform
#[derive(Clone, Debug, PartialEq)]
pub struct PostRecord {
    /// Server-assigned identifier
    pub id: String,
    /// Title the post was registered with
    pub title: String,
    /// Category the post was registered under
    pub category_id: u32,
    /// Feed visibility
    pub visibility: Visibility,
    /// Full response payload
    pub raw: serde_json::Value,
}

/// Outcome of publishing one file
#[derive(Debug)]
pub struct PublishOutcome {
    /// The file that was published
    pub media: DownloadedMedia,
    /// The created post, or the error message
    pub result: std::result::Result<PostRecord, String>,
}

/// Summary of a job run
#[derive(Debug, Default)]
pub struct JobReport {
    /// Discovery + download attempts made
    pub attempts: u32,
    /// Files that were downloaded and verified
    pub downloaded: usize,
    /// Per-file publish outcomes, in publish order
    pub outcomes: Vec<PublishOutcome>,
}

impl JobReport {
    /// Posts that were created
    pub fn published(&self) -> impl Iterator<Item = &PostRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Number of files whose publish failed
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}
