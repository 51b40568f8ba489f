//! Listing store
//!
//! Persistent home of reconciled listing records, keyed by URL. The store
//! holds whatever the reconciliation engine last produced; it knows nothing
//! about protection or fingerprints.

pub mod memory;
pub mod persistence;

pub use memory::MemoryListingStore;
pub use persistence::SledListingStore;

use crate::error::StorageError;
use crate::listing::Listing;

/// Persistent map of URL to reconciled listing record.
pub trait ListingStore: Send + Sync {
    /// Fetch the stored record for a URL.
    ///
    /// A record that can no longer be deserialized is reported as absent so
    /// the next reconciliation rebuilds it from scratch.
    fn get(&self, url: &str) -> Result<Option<Listing>, StorageError>;

    /// Store a record, replacing any prior one for the same URL.
    fn put(&self, listing: &Listing) -> Result<(), StorageError>;

    /// All stored records, ordered by URL.
    fn all(&self) -> Result<Vec<Listing>, StorageError>;

    /// Remove every record, returning the removed count.
    fn remove_all(&self) -> Result<usize, StorageError>;
}
