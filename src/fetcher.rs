//! Per-link media retrieval
//!
//! Every fetch works in its own staging directory below the download
//! directory, so concurrent fetches never see each other's partial files. Once
//! the resolver is done, the file is moved to its final deterministic name and
//! checked again: a missing or zero-byte file is a failed fetch, whatever the
//! resolver reported.

use crate::config::{DownloadConfig, SearchConfig};
use crate::error::FetchError;
use crate::resolver::MediaResolver;
use crate::types::{CandidateLink, DownloadedMedia, PostReference};
use crate::utils::{media_file_name, move_file, verify_nonempty};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves candidate links to verified local media files
pub struct ContentFetcher {
    resolver: Arc<dyn MediaResolver>,
    download_dir: PathBuf,
    platform_label: String,
    link_marker: String,
}

impl ContentFetcher {
    /// Create a fetcher that writes into `download.download_dir`
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        download: &DownloadConfig,
        search: &SearchConfig,
    ) -> Self {
        Self {
            resolver,
            download_dir: download.download_dir.clone(),
            platform_label: download.platform_label.clone(),
            link_marker: search.link_marker.clone(),
        }
    }

    /// Directory final files are written to
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Final path for the `index`-th post
    pub fn destination(&self, index: usize, reference: &PostReference) -> PathBuf {
        self.download_dir.join(media_file_name(
            &self.platform_label,
            index,
            &reference.shortcode,
        ))
    }

    /// Resolve `link` and verify the result
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the link has no shortcode, the resolver
    /// fails, the move fails, or the final file is missing or empty.
    pub async fn try_fetch(
        &self,
        link: &CandidateLink,
        index: usize,
    ) -> Result<DownloadedMedia, FetchError> {
        let reference = PostReference::from_link(link, &self.link_marker).ok_or_else(|| {
            FetchError::MalformedLink {
                url: link.url.clone(),
            }
        })?;

        let staging = self.download_dir.join(format!(".staging_{index}"));
        let result = self.fetch_into(&reference, index, &staging).await;

        if let Err(e) = tokio::fs::remove_dir_all(&staging).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::debug!(path = %staging.display(), error = %e, "failed to clean staging dir");
        }

        result
    }

    async fn fetch_into(
        &self,
        reference: &PostReference,
        index: usize,
        staging: &Path,
    ) -> Result<DownloadedMedia, FetchError> {
        let resolve_failed = |reason: String| FetchError::Resolve {
            shortcode: reference.shortcode.clone(),
            reason,
        };

        tokio::fs::create_dir_all(staging)
            .await
            .map_err(|e| resolve_failed(format!("cannot create {}: {e}", staging.display())))?;

        let written = self
            .resolver
            .resolve(reference, staging)
            .await
            .map_err(|e| resolve_failed(e.to_string()))?;

        let dest = self.destination(index, reference);
        move_file(&written, &dest).await?;
        let size = verify_nonempty(&dest).await?;

        tracing::info!(
            index,
            shortcode = %reference.shortcode,
            path = %dest.display(),
            size,
            "downloaded video"
        );

        Ok(DownloadedMedia {
            local_path: dest,
            index,
            source: reference.clone(),
        })
    }

    /// Like [`try_fetch`](Self::try_fetch), but failures are logged and
    /// reported as `None`
    pub async fn fetch(&self, link: &CandidateLink, index: usize) -> Option<DownloadedMedia> {
        match self.try_fetch(link, index).await {
            Ok(media) => Some(media),
            Err(e @ FetchError::MalformedLink { .. }) => {
                tracing::warn!(index, error = %e, "invalid video URL");
                None
            }
            Err(e) => {
                tracing::error!(index, url = %link, error = %e, "error downloading video");
                None
            }
        }
    }
}
