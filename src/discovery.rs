//! Link discovery through a search surface
//!
//! Discovery is a soft-failure component. [`LinkDiscoverer::try_discover`]
//! keeps the distinction between "the search ran and found nothing" (`Ok` with
//! an empty list) and "the search did not run" (`Err`). The job orchestrator
//! treats both the same way, so [`LinkDiscoverer::discover`] collapses errors
//! into an empty list after logging them. Callers read "no links" as "try
//! again or give up", never as a hard error.

use crate::config::SearchConfig;
use crate::error::DiscoveryError;
use crate::surface::SearchSurface;
use crate::types::{CandidateLink, SearchQuery};
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

/// Finds post links for a keyword
pub struct LinkDiscoverer {
    surface: Arc<dyn SearchSurface>,
    config: SearchConfig,
}

impl LinkDiscoverer {
    /// Create a discoverer over `surface`
    pub fn new(surface: Arc<dyn SearchSurface>, config: SearchConfig) -> Self {
        Self { surface, config }
    }

    /// The query that will be submitted for `keyword`
    pub fn query_for(&self, keyword: &str) -> SearchQuery {
        SearchQuery::new(
            keyword,
            self.config.platform_scope.clone(),
            self.config.content_tag.clone(),
        )
    }

    /// Search for `keyword` and return up to `max_results` post links
    ///
    /// Links keep the order the search surface returned them in. Results past
    /// the `max_results`-th match are not inspected.
    ///
    /// # Errors
    ///
    /// Propagates the surface's [`DiscoveryError`].
    pub async fn try_discover(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateLink>, DiscoveryError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let query = self.query_for(keyword);
        tracing::info!(query = %query, max_results, surface = self.surface.name(), "searching");

        let hrefs = self.surface.search(&query, self.config.result_wait).await?;
        let links = select_links(&hrefs, &self.config.link_marker, max_results);

        tracing::info!(
            rendered = hrefs.len(),
            matched = links.len(),
            "found {} post links",
            links.len()
        );
        Ok(links)
    }

    /// Like [`try_discover`](Self::try_discover), but any failure becomes an
    /// empty list
    pub async fn discover(&self, keyword: &str, max_results: usize) -> Vec<CandidateLink> {
        match self.try_discover(keyword, max_results).await {
            Ok(links) => links,
            Err(e) => {
                tracing::error!(error = %e, "search failed");
                Vec::new()
            }
        }
    }
}

/// Keep hrefs that point at posts, in order, stopping after `max_results`
fn select_links(hrefs: &[String], marker: &str, max_results: usize) -> Vec<CandidateLink> {
    let mut links = Vec::new();
    for href in hrefs {
        let target = unwrap_redirect(href);
        match CandidateLink::parse(&target, marker) {
            Some(link) => {
                links.push(link);
                if links.len() >= max_results {
                    break;
                }
            }
            None => tracing::trace!(href = %href, "skipping non-post link"),
        }
    }
    links
}

/// Target of a search-engine redirect link (`/url?q=<target>`), or the href itself
fn unwrap_redirect(href: &str) -> Cow<'_, str> {
    let Ok(url) = Url::parse(href) else {
        return Cow::Borrowed(href);
    };
    if url.path() != "/url" {
        return Cow::Borrowed(href);
    }
    url.query_pairs()
        .find(|(k, _)| k == "q" || k == "url")
        .map(|(_, v)| Cow::Owned(v.into_owned()))
        .unwrap_or(Cow::Borrowed(href))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedSurface, reel_url};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn discoverer(surface: Arc<ScriptedSurface>) -> LinkDiscoverer {
        LinkDiscoverer::new(surface, SearchConfig::default())
    }

    #[tokio::test]
    async fn submits_site_scoped_query() {
        let surface = Arc::new(ScriptedSurface::returning(&[]));
        discoverer(surface.clone()).discover("sunset", 5).await;
        assert_eq!(
            surface.queries.lock().unwrap().as_slice(),
            ["site:instagram.com sunset reel"]
        );
    }

    #[tokio::test]
    async fn keeps_only_post_links_in_order() {
        let surface = Arc::new(ScriptedSurface::returning(&[
            "https://www.instagram.com/explore/tags/sunset/",
            &reel_url("AAA"),
            "https://example.com/reel/notinstagram/",
            &reel_url("BBB"),
        ]));
        let links = discoverer(surface).discover("sunset", 10).await;
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                reel_url("AAA").as_str(),
                "https://example.com/reel/notinstagram/",
                reel_url("BBB").as_str()
            ],
            "pattern is the path marker; the site scope lives in the query"
        );
    }

    #[tokio::test]
    async fn stops_after_max_results() {
        let surface = Arc::new(ScriptedSurface::returning(&[
            &reel_url("A1"),
            &reel_url("A2"),
            &reel_url("A3"),
        ]));
        let links = discoverer(surface).discover("sunset", 2).await;
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].url, reel_url("A2"));
    }

    #[tokio::test]
    async fn zero_max_results_skips_the_search() {
        let surface = Arc::new(ScriptedSurface::returning(&[&reel_url("A1")]));
        let links = discoverer(surface.clone()).discover("sunset", 0).await;
        assert!(links.is_empty());
        assert_eq!(surface.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn surface_failure_collapses_to_empty() {
        let surface = Arc::new(ScriptedSurface::new(vec![Err(DiscoveryError::Timeout {
            waited: Duration::from_secs(10),
        })]));
        let d = discoverer(surface);

        assert!(matches!(
            d.try_discover("sunset", 5).await,
            Err(DiscoveryError::Timeout { .. })
        ));
        assert!(d.discover("sunset", 5).await.is_empty());
    }

    #[test]
    fn redirect_wrappers_are_unwrapped() {
        assert_eq!(
            unwrap_redirect("https://www.google.com/url?q=https://www.instagram.com/reel/X1/&sa=U"),
            "https://www.instagram.com/reel/X1/"
        );
        assert_eq!(
            unwrap_redirect("https://www.instagram.com/reel/X1/"),
            "https://www.instagram.com/reel/X1/"
        );
        assert_eq!(unwrap_redirect("not a url"), "not a url");
    }

    #[test]
    fn redirected_links_count_towards_matches() {
        let hrefs = vec![
            "https://www.google.com/url?q=https://www.instagram.com/reel/X1/".to_string(),
            "https://www.google.com/search?q=more".to_string(),
        ];
        let links = select_links(&hrefs, "reel", 5);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://www.instagram.com/reel/X1/");
    }
}
