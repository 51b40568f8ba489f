//! Durability across process restarts
//!
//! The cache, ledger, and listing store share one sled database; these tests
//! close and reopen it to confirm reconciliation decisions survive a restart.

use super::test_utils::{open_harness, scripted_listing};
use hearth::cache::{CacheEntry, ContentCache};
use hearth::listing::Field;
use hearth::store::ListingStore;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;

const URL: &str = "https://example.com/listing/1";
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::test]
async fn test_manual_edit_protection_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("db");

    {
        let harness = open_harness(&db_path);
        harness.source.set(scripted_listing(URL, "$1200"));
        harness.service.add(URL, false).await.unwrap();

        let mut stored = harness.service.get(URL).unwrap();
        stored.price = "$1150 negotiated".to_string();
        harness.store.put(&stored).unwrap();
        harness.db.flush().unwrap();
    }

    let harness = open_harness(&db_path);
    harness.source.set(scripted_listing(URL, "$1300"));
    harness.service.rescrape(false).await.unwrap();
    assert_eq!(harness.service.get(URL).unwrap().price, "$1150 negotiated");
}

#[tokio::test]
async fn test_forced_protection_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("db");

    {
        let harness = open_harness(&db_path);
        harness.source.set(scripted_listing(URL, "$1200"));
        harness.service.add(URL, false).await.unwrap();
        harness
            .service
            .ledger_protect(URL, &[Field::Address])
            .unwrap();
        harness.db.flush().unwrap();
    }

    let harness = open_harness(&db_path);
    let mut candidate = scripted_listing(URL, "$1200");
    candidate.address = "relocated to 9 Elm St".to_string();
    harness.source.set(candidate);
    harness.service.rescrape(false).await.unwrap();
    assert_eq!(harness.service.get(URL).unwrap().address, "123 Main St");
}

#[tokio::test]
async fn test_cached_pages_survive_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("db");

    {
        let harness = open_harness(&db_path);
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        harness
            .cache
            .store(URL, CacheEntry::new("<html>cached</html>", 200, headers))
            .unwrap();
        harness.db.flush().unwrap();
    }

    let harness = open_harness(&db_path);
    let entry = harness.cache.lookup(URL, WEEK).unwrap().unwrap();
    assert_eq!(entry.content, "<html>cached</html>");
    assert_eq!(entry.status, 200);
    assert_eq!(
        entry.headers.get("content-type").map(String::as_str),
        Some("text/html")
    );
}

#[tokio::test]
async fn test_stored_listings_survive_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("db");

    {
        let harness = open_harness(&db_path);
        harness.source.set(scripted_listing(URL, "$1200"));
        harness
            .source
            .set(scripted_listing("https://example.com/listing/2", "$900"));
        harness.service.add(URL, false).await.unwrap();
        harness
            .service
            .add("https://example.com/listing/2", false)
            .await
            .unwrap();
        harness.service.update_notes(URL, "keeper").unwrap();
        harness.db.flush().unwrap();
    }

    let harness = open_harness(&db_path);
    let listings = harness.service.list().unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(harness.service.get(URL).unwrap().notes, "keeper");
}
