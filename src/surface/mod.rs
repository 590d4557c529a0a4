//! Search surfaces that render result pages
//!
//! A [`SearchSurface`] takes a composed [`SearchQuery`] and returns the target
//! URLs of the result anchors, in the order the page rendered them. It is a
//! stateful resource: the job orchestrator tears it down with
//! [`SearchSurface::close`] once discovery is over.

mod browserless;

pub use browserless::BrowserlessSurface;

use crate::error::DiscoveryError;
use crate::types::SearchQuery;
use async_trait::async_trait;
use std::time::Duration;

/// Capability contract for something that can run a web search
///
/// Implementations can drive a real rendering service or return canned
/// markup for tests.
#[async_trait]
pub trait SearchSurface: Send + Sync {
    /// Run `query` and return the href of every result anchor
    ///
    /// `wait` bounds how long the implementation waits for the result
    /// container to appear. Hrefs are absolute URLs, in page order.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] if the results never render within
    /// `wait`, the surface is unreachable, or the session was already closed.
    async fn search(
        &self,
        query: &SearchQuery,
        wait: Duration,
    ) -> Result<Vec<String>, DiscoveryError>;

    /// Release the session. Best effort; never fails.
    async fn close(&self);

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
