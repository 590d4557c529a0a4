//! Content-download collaborators
//!
//! A [`MediaResolver`] turns a [`PostReference`] into one media file written
//! into a directory the caller chooses. The contract is deliberately weak: a
//! resolver may report success and still leave an empty or truncated file, so
//! callers verify the output themselves.

mod ytdlp;

pub use ytdlp::YtDlpResolver;

use crate::types::PostReference;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Capability contract for resolving a post to a local media file
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Download the media of `reference` into `output_dir`
    ///
    /// # Returns
    ///
    /// Path of the file that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the post cannot be resolved or the download fails.
    async fn resolve(&self, reference: &PostReference, output_dir: &Path)
    -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
