//! End-to-end job: discover, download, publish
//!
//! A job runs two phases:
//!
//! 1. **Acquire**: discovery plus concurrent download, retried with a fixed
//!    backoff until at least one file lands or the attempt cap is reached. The
//!    search surface is closed exactly once afterwards, on every exit path:
//!    early errors, panics, and abandonment through
//!    [`JobOrchestrator::shutdown`].
//! 2. **Publish**: every downloaded file is published one at a time, in index
//!    order. A published file is deleted. A failed publish leaves the file on
//!    disk and the job moves on to the next one.

use crate::config::Config;
use crate::coordinator::DownloadCoordinator;
use crate::discovery::LinkDiscoverer;
use crate::fetcher::ContentFetcher;
use crate::resolver::MediaResolver;
use crate::retry::{IsRetryable, retry_until};
use crate::surface::SearchSurface;
use crate::types::{DownloadedMedia, JobReport, PublishOutcome};
use crate::upload::UploadPipeline;
use crate::utils::{ensure_dir, remove_file_best_effort};
use crate::{Error, Result};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Wires the pipeline components together for a single run
///
/// The search surface is released when the first run finishes discovery, so an
/// orchestrator runs once. Build a new one (with a new surface) per keyword.
pub struct JobOrchestrator {
    config: Config,
    surface: Arc<dyn SearchSurface>,
    surface_released: AtomicBool,
    coordinator: DownloadCoordinator,
    uploader: UploadPipeline,
}

impl JobOrchestrator {
    /// Build an orchestrator over the given collaborators
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the HTTP client cannot be
    /// built.
    pub fn new(
        config: Config,
        surface: Arc<dyn SearchSurface>,
        resolver: Arc<dyn MediaResolver>,
    ) -> Result<Self> {
        config.validate()?;

        let discoverer = LinkDiscoverer::new(Arc::clone(&surface), config.search.clone());
        let fetcher = ContentFetcher::new(resolver, &config.download, &config.search);
        let uploader = UploadPipeline::new(&config.upload)?;

        Ok(Self {
            coordinator: DownloadCoordinator::new(discoverer, fetcher),
            surface,
            surface_released: AtomicBool::new(false),
            uploader,
            config,
        })
    }

    /// Run the whole job for `keyword`
    ///
    /// Returns a report of what was downloaded and published. Finding nothing
    /// is not an error; neither is a failed publish, which is recorded in the
    /// report instead.
    ///
    /// # Errors
    ///
    /// Fails if the keyword is blank, the download directory cannot be
    /// created, or the orchestrator has already run.
    pub async fn run(&self, keyword: &str) -> Result<JobReport> {
        if self.surface_released.load(Ordering::SeqCst) {
            return Err(Error::NotSupported(
                "search surface already released; a job orchestrator runs once".into(),
            ));
        }

        let keyword = keyword.trim();
        let acquired = AssertUnwindSafe(self.acquire(keyword)).catch_unwind().await;
        self.release_surface().await;

        let (downloaded, attempts) = match acquired {
            Ok(result) => result?,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        let mut report = JobReport {
            attempts,
            downloaded: downloaded.len(),
            outcomes: Vec::with_capacity(downloaded.len()),
        };

        if downloaded.is_empty() {
            tracing::warn!(attempts, "No videos were downloaded, skipping upload");
            return Ok(report);
        }

        tracing::info!(count = downloaded.len(), "downloaded videos, starting upload");
        let title = self.config.upload.title_for(keyword);
        for media in downloaded {
            report.outcomes.push(self.publish_one(media, &title).await);
        }

        tracing::info!(
            published = report.published().count(),
            failed = report.failed(),
            "job finished"
        );
        Ok(report)
    }

    /// Release the search surface, for callers that abandon a run
    ///
    /// A no-op if the surface was already released.
    pub async fn shutdown(&self) {
        self.release_surface().await;
    }

    async fn release_surface(&self) {
        if !self.surface_released.swap(true, Ordering::SeqCst) {
            self.surface.close().await;
        }
    }

    /// Validation, directory setup, then discovery and download with retry
    async fn acquire(&self, keyword: &str) -> Result<(Vec<DownloadedMedia>, u32)> {
        if keyword.is_empty() {
            return Err(Error::config("keyword", "keyword must not be empty"));
        }

        let dir = ensure_dir(self.coordinator.fetcher().download_dir()).await?;
        tracing::info!(keyword, dir = %dir.display(), "starting job");

        let max = self.config.download.max_videos;
        let outcome = retry_until(
            &self.config.retry,
            |attempt| {
                tracing::info!(attempt, max_attempts = self.config.retry.max_attempts, "download attempt");
                self.coordinator.download_all(keyword, max)
            },
            |media: &Vec<DownloadedMedia>| !media.is_empty(),
        )
        .await;

        Ok((outcome.value, outcome.attempts))
    }

    async fn publish_one(&self, media: DownloadedMedia, title: &str) -> PublishOutcome {
        let result = self
            .uploader
            .publish(&media.local_path, title, self.config.upload.category_id)
            .await;

        match result {
            Ok(record) => {
                tracing::info!(
                    index = media.index,
                    post_id = %record.id,
                    "published video"
                );
                if remove_file_best_effort(&media.local_path).await {
                    tracing::debug!(path = %media.local_path.display(), "deleted local file");
                }
                PublishOutcome {
                    media,
                    result: Ok(record),
                }
            }
            Err(e) => {
                tracing::error!(
                    index = media.index,
                    path = %media.local_path.display(),
                    error = %e,
                    transient = e.is_retryable(),
                    "error uploading video, keeping local file"
                );
                PublishOutcome {
                    media,
                    result: Err(e.to_string()),
                }
            }
        }
    }
}
