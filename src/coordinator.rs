//! Concurrent download fan-out

use crate::discovery::LinkDiscoverer;
use crate::fetcher::ContentFetcher;
use crate::types::{CandidateLink, DownloadedMedia};
use futures::future::join_all;

/// Runs discovery once, then fetches every discovered link concurrently
pub struct DownloadCoordinator {
    discoverer: LinkDiscoverer,
    fetcher: ContentFetcher,
}

impl DownloadCoordinator {
    /// Create a coordinator
    pub fn new(discoverer: LinkDiscoverer, fetcher: ContentFetcher) -> Self {
        Self {
            discoverer,
            fetcher,
        }
    }

    /// The fetcher used for downloads
    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// Discover up to `max_results` links for `keyword` and download them
    ///
    /// Returns the successful downloads ordered by their 1-based discovery
    /// index. Failed fetches are dropped (they are logged by the fetcher).
    pub async fn download_all(&self, keyword: &str, max_results: usize) -> Vec<DownloadedMedia> {
        let links = self.discoverer.discover(keyword, max_results).await;
        self.download_links(&links).await
    }

    /// Fetch `links` concurrently, numbering them from 1 in slice order
    ///
    /// All fetches start at once with no rate limit; the batch is bounded by
    /// the caller's `max_results`.
    pub async fn download_links(&self, links: &[CandidateLink]) -> Vec<DownloadedMedia> {
        if links.is_empty() {
            return Vec::new();
        }

        let fetches = links
            .iter()
            .enumerate()
            .map(|(i, link)| self.fetcher.fetch(link, i + 1));

        // join_all yields results in input order, so indices stay ascending
        let downloaded: Vec<DownloadedMedia> =
            join_all(fetches).await.into_iter().flatten().collect();

        tracing::info!(
            requested = links.len(),
            downloaded = downloaded.len(),
            "download batch settled"
        );
        downloaded
    }
}
