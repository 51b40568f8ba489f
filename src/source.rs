//! Record source adapters
//!
//! A source adapter turns a listing URL into a normalized candidate record.
//! Site-specific extraction lives behind this trait; the rest of the system
//! only sees candidate `Listing`s and typed failures.

use crate::error::SourceError;
use crate::fetch::PageFetcher;
use crate::listing::Listing;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Produces normalized candidate records for listing URLs.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Adapter name, for logs and batch reports.
    fn name(&self) -> &str;

    /// Whether this adapter handles the given URL.
    fn supports(&self, url: &str) -> bool;

    /// Fetch and normalize a candidate record for the URL.
    ///
    /// Partial extraction is fine: fields the adapter cannot produce stay
    /// empty and reconciliation keeps whatever is already stored for them.
    async fn fetch_listing(&self, url: &str) -> Result<Listing, SourceError>;
}

/// Ordered collection of source adapters.
///
/// Selection is first-match in registration order, so registers the most
/// specific adapters first.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn ListingSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn ListingSource>) {
        self.sources.push(source);
    }

    /// First registered adapter that supports the URL.
    pub fn find(&self, url: &str) -> Option<Arc<dyn ListingSource>> {
        self.sources.iter().find(|s| s.supports(url)).cloned()
    }

    /// Fetch a candidate through the matching adapter.
    pub async fn fetch_listing(&self, url: &str) -> Result<Listing, SourceError> {
        let source = self
            .find(url)
            .ok_or_else(|| SourceError::Unsupported(url.to_string()))?;
        source.fetch_listing(url).await
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

/// Fallback adapter for any HTTP(S) URL.
///
/// Fetches the page through the cache-first fetcher to confirm it exists and
/// to populate the content cache, but extracts nothing from it: the candidate
/// carries only the URL. Real extraction belongs to site-specific adapters
/// registered ahead of this one.
pub struct PageSource {
    fetcher: Arc<PageFetcher>,
    max_age: Duration,
}

impl PageSource {
    pub fn new(fetcher: Arc<PageFetcher>, max_age: Duration) -> Self {
        PageSource { fetcher, max_age }
    }
}

#[async_trait]
impl ListingSource for PageSource {
    fn name(&self) -> &str {
        "page"
    }

    fn supports(&self, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn fetch_listing(&self, url: &str) -> Result<Listing, SourceError> {
        let page = self.fetcher.get(url, self.max_age).await?;
        debug!(url = %url, status = page.status, from_cache = page.from_cache, "Fetched listing page");
        Ok(Listing::new(url))
    }
}
