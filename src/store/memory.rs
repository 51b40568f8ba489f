//! In-memory listing store for tests and dry runs

use crate::error::StorageError;
use crate::listing::Listing;
use crate::store::ListingStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Listing store backed by a map, with no persistence.
#[derive(Default)]
pub struct MemoryListingStore {
    inner: RwLock<BTreeMap<String, Listing>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListingStore for MemoryListingStore {
    fn get(&self, url: &str) -> Result<Option<Listing>, StorageError> {
        Ok(self.inner.read().get(url).cloned())
    }

    fn put(&self, listing: &Listing) -> Result<(), StorageError> {
        self.inner
            .write()
            .insert(listing.url.clone(), listing.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<Listing>, StorageError> {
        Ok(self.inner.read().values().cloned().collect())
    }

    fn remove_all(&self) -> Result<usize, StorageError> {
        let mut inner = self.inner.write();
        let count = inner.len();
        inner.clear();
        Ok(count)
    }
}
