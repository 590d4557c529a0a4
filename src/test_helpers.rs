//! Shared test doubles for the search surface and media resolver.

use crate::error::DiscoveryError;
use crate::resolver::MediaResolver;
use crate::surface::SearchSurface;
use crate::types::{PostReference, SearchQuery};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Surface that replays one scripted response per call, repeating the last one
pub(crate) struct ScriptedSurface {
    responses: Mutex<Vec<Result<Vec<String>, DiscoveryError>>>,
    pub(crate) searches: AtomicUsize,
    pub(crate) closes: AtomicUsize,
    pub(crate) queries: Mutex<Vec<String>>,
}

impl ScriptedSurface {
    pub(crate) fn new(responses: Vec<Result<Vec<String>, DiscoveryError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            searches: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn returning(hrefs: &[&str]) -> Self {
        Self::new(vec![Ok(hrefs.iter().map(|s| s.to_string()).collect())])
    }
}

#[async_trait]
impl SearchSurface for ScriptedSurface {
    async fn search(
        &self,
        query: &SearchQuery,
        wait: Duration,
    ) -> Result<Vec<String>, DiscoveryError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            match responses.first() {
                Some(Ok(hrefs)) => Ok(hrefs.clone()),
                Some(Err(_)) | None => Err(DiscoveryError::Timeout { waited: wait }),
            }
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// What [`FakeResolver`] does for a shortcode
#[derive(Clone)]
pub(crate) enum Resolution {
    /// Write these bytes
    Bytes(Vec<u8>),
    /// Report success but write a zero-byte file
    Empty,
    /// Fail without writing anything
    Fail,
}

/// Resolver that writes canned bytes into the output directory
pub(crate) struct FakeResolver {
    plan: HashMap<String, Resolution>,
    delay: Duration,
    pub(crate) calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeResolver {
    pub(crate) fn new(plan: &[(&str, Resolution)]) -> Self {
        Self {
            plan: plan
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl MediaResolver for FakeResolver {
    async fn resolve(
        &self,
        reference: &PostReference,
        output_dir: &Path,
    ) -> crate::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let path = output_dir.join(format!("{}.mp4", reference.shortcode));
        match self.plan.get(&reference.shortcode) {
            Some(Resolution::Bytes(bytes)) => {
                tokio::fs::write(&path, bytes).await?;
                Ok(path)
            }
            Some(Resolution::Empty) => {
                tokio::fs::write(&path, b"").await?;
                Ok(path)
            }
            Some(Resolution::Fail) | None => Err(crate::Error::ExternalTool(format!(
                "no media for {}",
                reference.shortcode
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Canonical post URL for a shortcode
pub(crate) fn reel_url(shortcode: &str) -> String {
    format!("https://www.instagram.com/reel/{shortcode}/")
}
