//! CLI-based resolver using the external yt-dlp binary

use super::MediaResolver;
use crate::types::PostReference;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Post page the shortcode is appended to
const DEFAULT_POST_URL_BASE: &str = "https://www.instagram.com/reel/";

/// Resolver that shells out to `yt-dlp`
///
/// Only the video is written: no thumbnails, metadata, or comments.
///
/// # Examples
///
/// ```no_run
/// use reel_relay::resolver::{MediaResolver, YtDlpResolver};
/// use reel_relay::types::PostReference;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = YtDlpResolver::from_path().expect("yt-dlp not found in PATH");
/// let reference = PostReference { shortcode: "C1a2B3".into() };
/// let file = resolver.resolve(&reference, Path::new("downloads")).await?;
/// println!("wrote {}", file.display());
/// # Ok(())
/// # }
/// ```
pub struct YtDlpResolver {
    binary_path: PathBuf,
    post_url_base: String,
}

impl YtDlpResolver {
    /// Create a resolver with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            post_url_base: DEFAULT_POST_URL_BASE.to_string(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Uses the `which` crate to search for the `yt-dlp` binary.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Override the post page URL prefix
    pub fn with_post_url_base(mut self, base: impl Into<String>) -> Self {
        self.post_url_base = base.into();
        self
    }

    fn post_url(&self, reference: &PostReference) -> String {
        format!(
            "{}/{}/",
            self.post_url_base.trim_end_matches('/'),
            reference.shortcode
        )
    }

    fn build_args(&self, reference: &PostReference, output_dir: &Path) -> Vec<String> {
        let template = output_dir.join(format!("{}.%(ext)s", reference.shortcode));
        vec![
            "--no-progress".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "--no-simulate".into(),
            "--format".into(),
            "mp4/bestvideo*+bestaudio/best".into(),
            "--merge-output-format".into(),
            "mp4".into(),
            "--output".into(),
            template.to_string_lossy().into_owned(),
            "--print".into(),
            "after_move:filepath".into(),
            self.post_url(reference),
        ]
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(
        &self,
        reference: &PostReference,
        output_dir: &Path,
    ) -> crate::Result<PathBuf> {
        let output = Command::new(&self.binary_path)
            .args(self.build_args(reference, output_dir))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::Error::ExternalTool(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        match parse_printed_path(&output.stdout) {
            Some(path) => Ok(path),
            None => find_written_file(output_dir, &reference.shortcode)
                .await
                .ok_or_else(|| {
                    crate::Error::ExternalTool(format!(
                        "yt-dlp reported success but no file for {} was found",
                        reference.shortcode
                    ))
                }),
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Last non-empty stdout line, which `--print after_move:filepath` emits
fn parse_printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// First `{shortcode}.*` file in `dir`
async fn find_written_file(dir: &Path, shortcode: &str) -> Option<PathBuf> {
    let prefix = format!("{shortcode}.");
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) {
            return Some(entry.path());
        }
    }
    None
}
