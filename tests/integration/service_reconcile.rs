//! End-to-end reconciliation flows through the listing service

use super::test_utils::{open_harness, scripted_listing};
use hearth::ledger::fingerprint_of;
use hearth::listing::{Decision, Field};
use hearth::reconcile::IdentityOutcome;
use hearth::store::ListingStore;
use tempfile::TempDir;

const URL: &str = "https://example.com/listing/1";

#[tokio::test]
async fn test_scrape_then_manual_edit_then_rescrape() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();

    // Human corrects the price in the stored sheet.
    let mut stored = harness.service.get(URL).unwrap();
    stored.price = "$1150 negotiated".to_string();
    harness.store.put(&stored).unwrap();

    // The site raises the price; the manual edit must survive.
    harness.source.set(scripted_listing(URL, "$1300"));
    let report = harness.service.rescrape(false).await.unwrap();
    assert_eq!(report.skipped_protected(), 1);

    let stored = harness.service.get(URL).unwrap();
    assert_eq!(stored.price, "$1150 negotiated");
    // Fields the human never touched still track the site.
    assert_eq!(stored.beds, "2");
}

#[tokio::test]
async fn test_ledger_reset_lets_next_scrape_overwrite() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();

    let mut stored = harness.service.get(URL).unwrap();
    stored.price = "$1150 negotiated".to_string();
    harness.store.put(&stored).unwrap();

    harness
        .service
        .ledger_reset(URL, Some(&[Field::Price]))
        .unwrap();

    harness.source.set(scripted_listing(URL, "$1300"));
    harness.service.rescrape(false).await.unwrap();
    assert_eq!(harness.service.get(URL).unwrap().price, "$1300");

    // The adoption re-recorded the fingerprint, so a later manual edit is
    // protected again without any further ledger calls.
    let mut stored = harness.service.get(URL).unwrap();
    stored.price = "$1250 agreed".to_string();
    harness.store.put(&stored).unwrap();

    harness.source.set(scripted_listing(URL, "$1400"));
    harness.service.rescrape(false).await.unwrap();
    assert_eq!(harness.service.get(URL).unwrap().price, "$1250 agreed");
}

#[tokio::test]
async fn test_forced_protect_holds_unedited_field() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();

    // No manual edit happened, but the user wants the price frozen.
    let report = harness.service.ledger_protect(URL, &[Field::Price]).unwrap();
    assert_eq!(report.marked, 1);
    assert!(report.empty_fields.is_empty());

    harness.source.set(scripted_listing(URL, "$1300"));
    harness.service.rescrape(false).await.unwrap();
    assert_eq!(harness.service.get(URL).unwrap().price, "$1200");
}

#[tokio::test]
async fn test_notes_and_decision_survive_candidate_values() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();
    harness
        .service
        .update_notes(URL, "south-facing, quiet street")
        .unwrap();
    harness.service.set_decision(URL, "Interested").unwrap();

    // A candidate that carries notes and a decision of its own.
    let mut candidate = scripted_listing(URL, "$1200");
    candidate.notes = "scraped garbage".to_string();
    candidate.decision = Decision::Rejected;
    harness.source.set(candidate);

    harness.service.rescrape(false).await.unwrap();
    let stored = harness.service.get(URL).unwrap();
    assert_eq!(stored.notes, "south-facing, quiet street");
    assert_eq!(stored.decision, Decision::Interested);
}

#[tokio::test]
async fn test_add_many_collects_each_url() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    let first = "https://example.com/listing/1";
    let second = "https://example.com/listing/2";
    harness.source.set(scripted_listing(first, "$1200"));
    harness.source.set(scripted_listing(second, "$900"));

    let urls = vec![first.to_string(), second.to_string()];
    let report = harness.service.add_many(&urls, false).await.unwrap();
    assert_eq!(report.total(), 2);
    assert_eq!(report.applied(), 2);

    assert_eq!(harness.service.get(first).unwrap().price, "$1200");
    assert_eq!(harness.service.get(second).unwrap().price, "$900");
}

#[tokio::test]
async fn test_batch_reports_mixed_outcomes() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    let changed = "https://example.com/listing/changed";
    let edited = "https://example.com/listing/edited";
    let broken = "https://example.com/listing/broken";

    for url in [changed, edited, broken] {
        harness.source.set(scripted_listing(url, "$1000"));
        harness.service.add(url, false).await.unwrap();
    }

    // One listing gets a site-side change, one a manual edit, one breaks.
    harness.source.set(scripted_listing(changed, "$1100"));
    let mut stored = harness.service.get(edited).unwrap();
    stored.price = "$950 cash".to_string();
    harness.store.put(&stored).unwrap();
    harness.source.remove(broken);

    let report = harness.service.rescrape(false).await.unwrap();
    assert_eq!(report.total(), 3);
    assert_eq!(report.applied(), 1);
    assert_eq!(report.skipped_protected(), 1);
    assert_eq!(report.failed(), 1);

    let by_url: std::collections::HashMap<_, _> = report.results.iter().cloned().collect();
    assert!(matches!(
        by_url[changed],
        IdentityOutcome::Applied { adopted: 1, .. }
    ));
    assert_eq!(by_url[edited], IdentityOutcome::SkippedProtected);
    assert!(matches!(by_url[broken], IdentityOutcome::Failed { .. }));

    // The failed identity kept its previous record untouched.
    assert_eq!(harness.service.get(broken).unwrap().price, "$1000");
}

#[tokio::test]
async fn test_rescrape_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();

    harness.service.rescrape(false).await.unwrap();
    let first = harness.service.get(URL).unwrap();
    let ledger_first = harness.service.ledger_status(Some(URL)).unwrap();

    harness.service.rescrape(false).await.unwrap();
    let second = harness.service.get(URL).unwrap();
    let ledger_second = harness.service.ledger_status(Some(URL)).unwrap();

    let mut a = first.clone();
    let mut b = second.clone();
    a.scraped_at = String::new();
    b.scraped_at = String::new();
    assert_eq!(a, b);

    let fps = |entries: &[hearth::ledger::LedgerEntry]| {
        entries
            .iter()
            .map(|e| (e.field, e.fingerprint.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(fps(&ledger_first), fps(&ledger_second));
}

#[tokio::test]
async fn test_protection_scenario_matches_fingerprints() {
    let dir = TempDir::new().unwrap();
    let harness = open_harness(&dir.path().join("db"));

    harness.source.set(scripted_listing(URL, "$1200"));
    harness.service.add(URL, false).await.unwrap();

    // The ledger holds the digest of the automated price.
    let entries = harness.service.ledger_status(Some(URL)).unwrap();
    let price_entry = entries.iter().find(|e| e.field == Field::Price).unwrap();
    assert_eq!(price_entry.fingerprint, fingerprint_of("$1200"));

    // Stored value still hashes to the same digest: unprotected.
    let statuses = harness.service.protection_status(Some(URL)).unwrap();
    assert!(statuses[0].protected_fields.is_empty());

    // Stored value now hashes differently: protected.
    let mut stored = harness.service.get(URL).unwrap();
    stored.price = "$999".to_string();
    harness.store.put(&stored).unwrap();
    let statuses = harness.service.protection_status(Some(URL)).unwrap();
    assert_eq!(statuses[0].protected_fields, vec![Field::Price]);
}
