//! Content cache for fetched listing pages
//!
//! Stores raw page bodies keyed by URL so repeated runs within the freshness
//! window skip the network entirely. Entries carry the HTTP status and
//! response headers alongside the body, and age out rather than being
//! invalidated explicitly.

pub mod persistence;

pub use persistence::SledContentCache;

use crate::error::StorageError;
use crate::listing::now_millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A cached page fetch: body, status, headers, and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Epoch milliseconds of the fetch.
    pub fetched_at_ms: u64,
}

impl CacheEntry {
    /// Build an entry stamped with the current time.
    pub fn new(content: impl Into<String>, status: u16, headers: BTreeMap<String, String>) -> Self {
        CacheEntry {
            content: content.into(),
            status,
            headers,
            fetched_at_ms: now_millis(),
        }
    }

    /// Whether the entry is older than the given freshness window.
    pub fn is_stale(&self, max_age: Duration, now_ms: u64) -> bool {
        let age_ms = now_ms.saturating_sub(self.fetched_at_ms);
        age_ms > max_age.as_millis() as u64
    }
}

/// Aggregate view of the cache contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: u64,
    /// Fetch time of the oldest entry, epoch milliseconds.
    pub oldest_ms: Option<u64>,
    /// Fetch time of the newest entry, epoch milliseconds.
    pub newest_ms: Option<u64>,
    /// Entry counts grouped by HTTP status.
    pub by_status: BTreeMap<u16, u64>,
    pub total_content_bytes: u64,
}

/// Persistent cache of fetched page content, keyed by URL.
pub trait ContentCache: Send + Sync {
    /// Store a fetched page, replacing any prior entry for the URL.
    fn store(&self, url: &str, entry: CacheEntry) -> Result<(), StorageError>;

    /// Look up a page no older than `max_age`.
    ///
    /// Returns `None` when no entry exists or the entry is stale. Stale
    /// entries are left in place for `purge` to collect.
    fn lookup(&self, url: &str, max_age: Duration) -> Result<Option<CacheEntry>, StorageError>;

    /// Remove every entry older than `max_age`, returning the removed count.
    fn purge_older_than(&self, max_age: Duration) -> Result<usize, StorageError>;

    /// Remove all entries, returning the removed count.
    fn clear(&self) -> Result<usize, StorageError>;

    /// Snapshot aggregate statistics over all entries.
    fn statistics(&self) -> Result<CacheStatistics, StorageError>;
}
