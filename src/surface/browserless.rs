//! Search surface backed by a Browserless-compatible `/content` endpoint
//!
//! The service loads the search page in a headless browser, waits for the
//! result selector, and returns the rendered HTML. Anchors are then pulled out
//! with `scraper`.

use super::SearchSurface;
use crate::config::SearchConfig;
use crate::error::{DiscoveryError, Error};
use crate::types::SearchQuery;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

/// Time allowed for page navigation on top of the result wait
const NAVIGATION_GRACE: Duration = Duration::from_secs(15);

/// Rendering-service search surface
pub struct BrowserlessSurface {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    search_page: Url,
    selector_text: String,
    selector: Selector,
    navigation_grace: Duration,
    closed: AtomicBool,
}

impl BrowserlessSurface {
    /// Create a surface from search settings
    ///
    /// # Errors
    ///
    /// Fails if the search page URL or result selector is invalid, or the HTTP
    /// client cannot be built.
    pub fn new(config: &SearchConfig) -> crate::Result<Self> {
        let search_page = Url::parse(&config.search_page_url).map_err(|_| {
            Error::Discovery(DiscoveryError::InvalidSearchUrl(
                config.search_page_url.clone(),
            ))
        })?;
        let selector = Selector::parse(&config.result_selector).map_err(|e| {
            Error::Discovery(DiscoveryError::InvalidSelector {
                selector: config.result_selector.clone(),
                reason: e.to_string(),
            })
        })?;
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.browserless_url.trim_end_matches('/').to_string(),
            token: config.browserless_token.clone(),
            search_page,
            selector_text: config.result_selector.clone(),
            selector,
            navigation_grace: NAVIGATION_GRACE,
            closed: AtomicBool::new(false),
        })
    }

    /// Override the navigation allowance added to each result wait
    pub fn with_navigation_grace(mut self, grace: Duration) -> Self {
        self.navigation_grace = grace;
        self
    }

    /// Search page URL with the query attached
    fn page_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.search_page.clone();
        url.query_pairs_mut().append_pair("q", &query.to_string());
        url
    }

    async fn render(&self, page: &Url, wait: Duration) -> Result<String, DiscoveryError> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({
            "url": page.as_str(),
            "waitForSelector": {
                "selector": self.selector_text,
                "timeout": wait.as_millis() as u64,
            },
        });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            // Browserless answers 408 when waitForSelector expires
            if status.as_u16() == 408 || message.contains("TimeoutError") {
                return Err(DiscoveryError::Timeout { waited: wait });
            }
            return Err(DiscoveryError::Render {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl SearchSurface for BrowserlessSurface {
    async fn search(
        &self,
        query: &SearchQuery,
        wait: Duration,
    ) -> Result<Vec<String>, DiscoveryError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DiscoveryError::SessionClosed);
        }

        let page = self.page_url(query);
        tracing::debug!(url = %page, wait_ms = wait.as_millis() as u64, "rendering search page");

        let html = tokio::time::timeout(wait + self.navigation_grace, self.render(&page, wait))
            .await
            .map_err(|_| DiscoveryError::Timeout { waited: wait })??;

        let hrefs = extract_hrefs(&html, &self.selector, &page);
        if hrefs.is_empty() && !html.is_empty() {
            tracing::debug!(selector = %self.selector_text, "rendered page has no result anchors");
        }
        Ok(hrefs)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(surface = self.name(), "search session closed");
        }
    }

    fn name(&self) -> &'static str {
        "browserless"
    }
}

/// Absolute hrefs of every anchor matched by `selector`, in document order
fn extract_hrefs(html: &str, selector: &Selector, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .collect()
}
