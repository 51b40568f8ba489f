//! Cache-first page fetcher
//!
//! Wraps an HTTP client and the content cache. Every fetch consults the
//! cache before the network; successful responses are written back so the
//! next run within the freshness window never leaves the machine.

use crate::cache::{CacheEntry, ContentCache};
use crate::error::SourceError;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!("hearth/", env!("CARGO_PKG_VERSION"));

/// HTTP client construction parameters.
///
/// Timeouts are fixed at construction; there is no retry logic here.
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        FetcherOptions {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A fetched page, from the cache or the network.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub from_cache: bool,
}

/// Fetches pages through the content cache.
pub struct PageFetcher {
    client: Client,
    cache: Arc<dyn ContentCache>,
}

impl PageFetcher {
    pub fn new(cache: Arc<dyn ContentCache>, options: FetcherOptions) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(options.user_agent)
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(PageFetcher { client, cache })
    }

    /// Get a page, returning cached content when it is younger than `max_age`.
    ///
    /// Cache lookup failures degrade to a miss. Non-success HTTP statuses
    /// surface as errors and are not cached. A failed cache write is logged
    /// and swallowed; it never fails the fetch.
    pub async fn get(&self, url: &str, max_age: Duration) -> Result<FetchedPage, SourceError> {
        match self.cache.lookup(url, max_age) {
            Ok(Some(entry)) => {
                debug!(url = %url, "Serving page from cache");
                return Ok(FetchedPage {
                    content: entry.content,
                    status: entry.status,
                    headers: entry.headers,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(err) => {
                warn!(url = %url, error = %err, "Cache lookup failed, fetching from network");
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let headers = header_map(&response);
        let content = response.text().await.map_err(map_transport_error)?;

        let entry = CacheEntry::new(content.clone(), status.as_u16(), headers.clone());
        if let Err(err) = self.cache.store(url, entry) {
            warn!(url = %url, error = %err, "Failed to cache fetched page");
        }

        Ok(FetchedPage {
            content,
            status: status.as_u16(),
            headers,
            from_cache: false,
        })
    }
}

fn header_map(response: &reqwest::Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn map_transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Transport(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        SourceError::Transport(format!("Connection failed: {}", err))
    } else {
        SourceError::Transport(err.to_string())
    }
}
