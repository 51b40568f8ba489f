//! Sled-backed content cache

use crate::cache::{CacheEntry, CacheStatistics, ContentCache};
use crate::error::StorageError;
use crate::listing::now_millis;
use sled::{Db, Tree};
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

const TREE_CONTENT_CACHE: &str = "content_cache";

/// Content cache persisted in a named tree of a shared sled database.
pub struct SledContentCache {
    tree: Tree,
}

impl SledContentCache {
    /// Open the cache tree inside an already-open database.
    pub fn open(db: &Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_CONTENT_CACHE).map_err(to_storage_io)?;
        Ok(SledContentCache { tree })
    }

    fn decode(&self, url: &str, raw: &[u8]) -> Option<CacheEntry> {
        match serde_json::from_slice(raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(url = %url, error = %err, "Discarding corrupt cache entry");
                None
            }
        }
    }
}

impl ContentCache for SledContentCache {
    fn store(&self, url: &str, entry: CacheEntry) -> Result<(), StorageError> {
        let raw = serde_json::to_vec(&entry).map_err(to_storage_data)?;
        self.tree
            .insert(url.as_bytes(), raw)
            .map_err(to_storage_io)?;
        debug!(url = %url, status = entry.status, "Cached page content");
        Ok(())
    }

    fn lookup(&self, url: &str, max_age: Duration) -> Result<Option<CacheEntry>, StorageError> {
        let Some(raw) = self.tree.get(url.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let Some(entry) = self.decode(url, &raw) else {
            return Ok(None);
        };
        if entry.is_stale(max_age, now_millis()) {
            debug!(url = %url, fetched_at_ms = entry.fetched_at_ms, "Cache entry stale");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn purge_older_than(&self, max_age: Duration) -> Result<usize, StorageError> {
        let now = now_millis();
        let mut stale_keys = Vec::new();
        for item in self.tree.iter() {
            let (key, raw) = item.map_err(to_storage_io)?;
            let url = String::from_utf8_lossy(&key).to_string();
            match self.decode(&url, &raw) {
                Some(entry) if entry.is_stale(max_age, now) => stale_keys.push(key),
                Some(_) => {}
                // Unreadable entries are purged along with stale ones.
                None => stale_keys.push(key),
            }
        }
        let removed = stale_keys.len();
        for key in stale_keys {
            self.tree.remove(key).map_err(to_storage_io)?;
        }
        if removed > 0 {
            debug!(removed, "Purged stale cache entries");
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<usize, StorageError> {
        let count = self.tree.len();
        self.tree.clear().map_err(to_storage_io)?;
        Ok(count)
    }

    fn statistics(&self) -> Result<CacheStatistics, StorageError> {
        let mut stats = CacheStatistics::default();
        for item in self.tree.iter() {
            let (key, raw) = item.map_err(to_storage_io)?;
            let url = String::from_utf8_lossy(&key).to_string();
            let Some(entry) = self.decode(&url, &raw) else {
                continue;
            };
            stats.total_entries += 1;
            stats.total_content_bytes += entry.content.len() as u64;
            *stats.by_status.entry(entry.status).or_insert(0) += 1;
            stats.oldest_ms = Some(match stats.oldest_ms {
                Some(oldest) => oldest.min(entry.fetched_at_ms),
                None => entry.fetched_at_ms,
            });
            stats.newest_ms = Some(match stats.newest_ms {
                Some(newest) => newest.max(entry.fetched_at_ms),
                None => entry.fetched_at_ms,
            });
        }
        Ok(stats)
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::SerializationFailed(err.to_string())
}
