//! # reel-relay
//!
//! Finds short-form videos for a keyword, downloads them, and republishes them
//! to the SocialVerse "Flic" content API.
//!
//! ## Pipeline
//!
//! - **Discovery** runs a site-scoped web search through a [`SearchSurface`]
//!   and keeps the result links that point at posts.
//! - **Download** resolves every link concurrently through a
//!   [`MediaResolver`] and verifies each file before it is kept.
//! - **Publish** fingerprints each file, negotiates an upload slot, streams
//!   the bytes and registers the post, one file at a time.
//!
//! Discovery and download never fail hard; an empty result is retried with a
//! fixed backoff. Publish failures are reported per file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reel_relay::{BrowserlessSurface, Config, JobOrchestrator, YtDlpResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let surface = Arc::new(BrowserlessSurface::new(&config.search)?);
//!     let resolver = Arc::new(YtDlpResolver::from_path().ok_or("yt-dlp not found")?);
//!
//!     let job = JobOrchestrator::new(config, surface, resolver)?;
//!     let report = job.run("sunset").await?;
//!     for post in report.published() {
//!         println!("Video uploaded. Post ID: {}", post.id);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Concurrent download fan-out
pub mod coordinator;
/// Search-driven link discovery
pub mod discovery;
/// Error types
pub mod error;
/// Per-link media retrieval
pub mod fetcher;
/// Streaming content fingerprints
pub mod fingerprint;
/// End-to-end job orchestration
pub mod job;
/// Content-download collaborators
pub mod resolver;
/// Bounded retry with a fixed backoff
pub mod retry;
/// Search surfaces
pub mod surface;
/// Tracing setup
pub mod telemetry;
/// Core domain types
pub mod types;
/// Publishing to the content API
pub mod upload;
/// Utility functions
pub mod utils;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, RetryConfig, SearchConfig, UploadConfig};
pub use error::{DiscoveryError, Error, FetchError, Result, UploadError, UploadStage};
pub use job::JobOrchestrator;
pub use resolver::{MediaResolver, YtDlpResolver};
pub use surface::{BrowserlessSurface, SearchSurface};
pub use types::{
    CandidateLink, ContentFingerprint, DownloadedMedia, JobReport, PostRecord, PostReference,
    PublishOutcome, SearchQuery, UploadSlot, Visibility,
};

/// Run a job, abandoning it on a termination signal
///
/// On SIGTERM/SIGINT (Ctrl+C elsewhere) the search surface is released and
/// an error is returned. Files already on disk are left where they are.
///
/// # Example
///
/// ```no_run
/// use reel_relay::{Config, JobOrchestrator, run_with_shutdown};
/// # use reel_relay::{BrowserlessSurface, YtDlpResolver};
/// # use std::sync::Arc;
///
/// # async fn example() -> reel_relay::Result<()> {
/// # let config = Config::from_env()?;
/// # let surface = Arc::new(BrowserlessSurface::new(&config.search)?);
/// # let resolver = Arc::new(YtDlpResolver::new("yt-dlp".into()));
/// let job = JobOrchestrator::new(config, surface, resolver)?;
/// let report = run_with_shutdown(&job, "sunset").await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(job: &JobOrchestrator, keyword: &str) -> Result<JobReport> {
    run_until(job, keyword, wait_for_signal()).await
}

/// Run a job until it finishes or `shutdown` resolves, whichever is first
///
/// When `shutdown` wins, the in-flight run is dropped, the search surface is
/// released (at most once), and an error is returned.
pub async fn run_until<F>(job: &JobOrchestrator, keyword: &str, shutdown: F) -> Result<JobReport>
where
    F: std::future::Future<Output = ()>,
{
    tokio::select! {
        result = job.run(keyword) => result,
        () = shutdown => {
            job.shutdown().await;
            Err(Error::Other("interrupted by signal".into()))
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C signal");
            } else {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
