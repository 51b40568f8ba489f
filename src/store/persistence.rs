//! Sled-backed listing store

use crate::error::StorageError;
use crate::listing::Listing;
use crate::store::ListingStore;
use sled::{Db, Tree};
use std::io;
use tracing::{debug, warn};

const TREE_LISTINGS: &str = "listings";

/// Listing store persisted in a named tree of a shared sled database.
pub struct SledListingStore {
    tree: Tree,
}

impl SledListingStore {
    /// Open the listings tree inside an already-open database.
    pub fn open(db: &Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_LISTINGS).map_err(to_storage_io)?;
        Ok(SledListingStore { tree })
    }

    fn decode(&self, url: &str, raw: &[u8]) -> Option<Listing> {
        match serde_json::from_slice(raw) {
            Ok(listing) => Some(listing),
            Err(err) => {
                warn!(url = %url, error = %err, "Stored listing is unreadable, treating as absent");
                None
            }
        }
    }
}

impl ListingStore for SledListingStore {
    fn get(&self, url: &str) -> Result<Option<Listing>, StorageError> {
        let Some(raw) = self.tree.get(url.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        Ok(self.decode(url, &raw))
    }

    fn put(&self, listing: &Listing) -> Result<(), StorageError> {
        let raw = serde_json::to_vec(listing).map_err(to_storage_data)?;
        self.tree
            .insert(listing.url.as_bytes(), raw)
            .map_err(to_storage_io)?;
        debug!(url = %listing.url, "Stored listing record");
        Ok(())
    }

    fn all(&self) -> Result<Vec<Listing>, StorageError> {
        let mut listings = Vec::new();
        for item in self.tree.iter() {
            let (key, raw) = item.map_err(to_storage_io)?;
            let url = String::from_utf8_lossy(&key).to_string();
            if let Some(listing) = self.decode(&url, &raw) {
                listings.push(listing);
            }
        }
        listings.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(listings)
    }

    fn remove_all(&self) -> Result<usize, StorageError> {
        let count = self.tree.len();
        self.tree.clear().map_err(to_storage_io)?;
        Ok(count)
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::SerializationFailed(err.to_string())
}
