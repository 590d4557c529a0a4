//! In-process stand-ins for the search surface and media resolver

use async_trait::async_trait;
use reel_relay::{DiscoveryError, Error, MediaResolver, PostReference, SearchQuery, SearchSurface};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Surface that answers each search with the next scripted href list
///
/// Once the script runs out it keeps answering with an empty list.
pub struct RecordingSurface {
    script: Mutex<VecDeque<Vec<String>>>,
    pub searches: AtomicUsize,
    pub closes: AtomicUsize,
}

impl RecordingSurface {
    pub fn new(script: Vec<Vec<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            searches: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchSurface for RecordingSurface {
    async fn search(
        &self,
        _query: &SearchQuery,
        _wait: Duration,
    ) -> Result<Vec<String>, DiscoveryError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| DiscoveryError::SessionClosed)?
            .pop_front();
        Ok(next.unwrap_or_default())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Resolver that writes fixed content per shortcode; unknown shortcodes fail
pub struct CannedResolver {
    content: HashMap<String, Vec<u8>>,
    pub calls: AtomicUsize,
}

impl CannedResolver {
    pub fn new(content: &[(&str, &[u8])]) -> Self {
        Self {
            content: content
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for CannedResolver {
    async fn resolve(
        &self,
        reference: &PostReference,
        output_dir: &Path,
    ) -> reel_relay::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .content
            .get(&reference.shortcode)
            .ok_or_else(|| Error::ExternalTool(format!("unavailable: {}", reference.shortcode)))?;
        let path = output_dir.join(format!("{}.mp4", reference.shortcode));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}
