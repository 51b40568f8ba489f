//! Shared test utilities for integration tests
//!
//! Provides a scripted source adapter and a harness that wires a full
//! `ListingService` over one sled database, with handles to the individual
//! components so tests can simulate out-of-band edits.

use async_trait::async_trait;
use hearth::api::{ListingService, ServiceOptions};
use hearth::cache::SledContentCache;
use hearth::error::SourceError;
use hearth::ledger::SledFieldLedger;
use hearth::listing::Listing;
use hearth::source::{ListingSource, SourceRegistry};
use hearth::store::SledListingStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Source adapter that serves pre-scripted candidate records.
///
/// URLs with no scripted listing fail extraction, mimicking a page the
/// scraper cannot parse.
pub struct ScriptedSource {
    listings: Mutex<HashMap<String, Listing>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        ScriptedSource {
            listings: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, listing: Listing) {
        self.listings.lock().insert(listing.url.clone(), listing);
    }

    pub fn remove(&self, url: &str) {
        self.listings.lock().remove(url);
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn supports(&self, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn fetch_listing(&self, url: &str) -> Result<Listing, SourceError> {
        self.listings
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Extract(format!("no listing data on page {}", url)))
    }
}

/// A fully wired service plus handles to its components.
pub struct Harness {
    pub db: sled::Db,
    pub service: ListingService,
    pub cache: Arc<SledContentCache>,
    pub ledger: Arc<SledFieldLedger>,
    pub store: Arc<SledListingStore>,
    pub source: Arc<ScriptedSource>,
}

/// Open a service over the sled database at `db_path`.
///
/// Reopening the same path resumes the persisted state, which is how the
/// reopen tests simulate a process restart.
pub fn open_harness(db_path: &Path) -> Harness {
    let db = sled::open(db_path).unwrap();
    let cache = Arc::new(SledContentCache::open(&db).unwrap());
    let ledger = Arc::new(SledFieldLedger::open(&db).unwrap());
    let store = Arc::new(SledListingStore::open(&db).unwrap());
    let source = Arc::new(ScriptedSource::new());

    let mut sources = SourceRegistry::new();
    sources.register(source.clone());

    let service = ListingService::new(
        cache.clone(),
        ledger.clone(),
        store.clone(),
        sources,
        ServiceOptions::default(),
    );

    Harness {
        db,
        service,
        cache,
        ledger,
        store,
        source,
    }
}

/// A plausible scraped candidate for the given URL.
pub fn scripted_listing(url: &str, price: &str) -> Listing {
    let mut listing = Listing::new(url);
    listing.address = "123 Main St".to_string();
    listing.price = price.to_string();
    listing.beds = "2".to_string();
    listing.baths = "1".to_string();
    listing.sqft = "750".to_string();
    listing.house_type = "apartment".to_string();
    listing.amenities = vec!["washer".to_string(), "parking".to_string()];
    listing
}
