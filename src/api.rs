//! Listing service API
//!
//! Wires the content cache, field ledger, listing store, and source adapters
//! into the operations the CLI exposes. Every command is a thin wrapper over
//! one method here.

use crate::cache::{CacheStatistics, ContentCache};
use crate::error::HearthError;
use crate::ledger::{FieldLedger, LedgerEntry};
use crate::listing::{Decision, Field, Listing};
use crate::reconcile::{BatchDriver, BatchPolicy, BatchReport, Merged, ReconcileEngine};
use crate::source::SourceRegistry;
use crate::store::ListingStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables the service reads from configuration.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Freshness window for cached page content.
    pub cache_max_age: Duration,
    /// Fan-out width for batch reconciliation.
    pub concurrency: usize,
    pub batch_policy: BatchPolicy,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            cache_max_age: Duration::from_secs(168 * 60 * 60),
            concurrency: 4,
            batch_policy: BatchPolicy::SkipAndContinue,
        }
    }
}

/// One identity's live protection picture.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionStatus {
    pub url: String,
    pub protected_fields: Vec<Field>,
}

/// An identity carrying manual notes.
#[derive(Debug, Clone, Serialize)]
pub struct NotesEntry {
    pub url: String,
    pub notes: String,
}

/// Result of a forced-protection request.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectReport {
    pub marked: usize,
    /// Requested fields that are empty on the stored record.
    pub empty_fields: Vec<Field>,
    /// True when no stored record exists for the identity.
    pub missing_record: bool,
}

/// Listing collection service
///
/// Owns the storage components and the source registry; computes merges via
/// the reconciliation engine and reports outcomes to the caller.
pub struct ListingService {
    /// Page content cache, consulted before any network fetch
    cache: Arc<dyn ContentCache>,
    /// Fingerprint ledger deciding field protection
    ledger: Arc<dyn FieldLedger>,
    /// Canonical record storage
    store: Arc<dyn ListingStore>,
    /// Source adapters, first-match by URL
    sources: SourceRegistry,
    options: ServiceOptions,
}

impl ListingService {
    pub fn new(
        cache: Arc<dyn ContentCache>,
        ledger: Arc<dyn FieldLedger>,
        store: Arc<dyn ListingStore>,
        sources: SourceRegistry,
        options: ServiceOptions,
    ) -> Self {
        ListingService {
            cache,
            ledger,
            store,
            sources,
            options,
        }
    }

    fn engine(&self) -> ReconcileEngine {
        ReconcileEngine::new(self.ledger.clone())
    }

    fn driver(&self) -> BatchDriver {
        BatchDriver::new(
            self.sources.clone(),
            self.store.clone(),
            self.engine(),
            self.options.concurrency,
        )
        .with_policy(self.options.batch_policy)
    }

    /// Collect one listing: fetch, reconcile against the stored record, store.
    ///
    /// With `reset_fingerprints`, all ledger records for the identity are
    /// removed first so every field is treated as untouched.
    pub async fn add(&self, url: &str, reset_fingerprints: bool) -> Result<Merged, HearthError> {
        let url = validate_url(url)?;
        if reset_fingerprints {
            let removed = self.ledger.reset(url, None)?;
            info!(url = %url, removed, "Reset fingerprints before collect");
        }
        let merged = self.driver().collect(url, false).await?;
        info!(
            url = %url,
            created = merged.created,
            adopted = merged.adopted_changed,
            kept = merged.kept_protected,
            "Collected listing"
        );
        Ok(merged)
    }

    /// Collect a batch of URLs, reporting per-identity outcomes.
    pub async fn add_many(
        &self,
        urls: &[String],
        reset_fingerprints: bool,
    ) -> Result<BatchReport, HearthError> {
        if urls.is_empty() {
            return Err(HearthError::Validation("no URLs given".to_string()));
        }
        if reset_fingerprints {
            for url in urls {
                self.ledger.reset(url, None)?;
            }
        }
        Ok(self.driver().run(urls, false).await)
    }

    /// Re-collect every stored identity.
    ///
    /// `ignore_protection` bypasses the ledger and the notes/decision rules,
    /// overwriting manual edits with whatever the sources return.
    pub async fn rescrape(&self, ignore_protection: bool) -> Result<BatchReport, HearthError> {
        let urls: Vec<String> = self.store.all()?.into_iter().map(|l| l.url).collect();
        if ignore_protection {
            warn!(count = urls.len(), "Rescraping with protection disabled");
        }
        Ok(self.driver().run(&urls, ignore_protection).await)
    }

    /// Set the manual notes on a stored record.
    ///
    /// The new notes are fingerprinted so the ledger stays in sync; non-empty
    /// notes then protect themselves from future scrapes.
    pub fn update_notes(&self, url: &str, notes: &str) -> Result<Listing, HearthError> {
        let mut listing = self.get(url)?;
        self.ledger.record_fingerprint(url, Field::Notes, notes)?;
        listing.notes = notes.to_string();
        self.store.put(&listing)?;
        Ok(listing)
    }

    /// Set the decision on a stored record.
    ///
    /// The decision string must match the Decision enum exactly; invalid
    /// input is rejected before anything is touched.
    pub fn set_decision(&self, url: &str, decision: &str) -> Result<Listing, HearthError> {
        let decision: Decision = decision.parse()?;
        let mut listing = self.get(url)?;
        self.ledger
            .record_fingerprint(url, Field::Decision, decision.as_str())?;
        listing.decision = decision;
        self.store.put(&listing)?;
        Ok(listing)
    }

    pub fn list(&self) -> Result<Vec<Listing>, HearthError> {
        Ok(self.store.all()?)
    }

    pub fn get(&self, url: &str) -> Result<Listing, HearthError> {
        self.store
            .get(url)?
            .ok_or_else(|| HearthError::RecordNotFound(url.to_string()))
    }

    /// Delete every stored record and its ledger entries.
    pub fn clear_records(&self) -> Result<usize, HearthError> {
        let removed = self.store.remove_all()?;
        let ledger_removed = self.ledger.clear_all()?;
        info!(removed, ledger_removed, "Cleared stored records");
        Ok(removed)
    }

    /// Identities carrying non-empty manual notes.
    pub fn notes_status(&self) -> Result<Vec<NotesEntry>, HearthError> {
        Ok(self
            .store
            .all()?
            .into_iter()
            .filter(|l| !l.notes.trim().is_empty())
            .map(|l| NotesEntry {
                url: l.url,
                notes: l.notes,
            })
            .collect())
    }

    /// Live protection sweep: which fields a rescrape would keep, per record.
    ///
    /// Distinct from the raw ledger status — this evaluates `is_protected`
    /// against the currently stored values.
    pub fn protection_status(
        &self,
        url: Option<&str>,
    ) -> Result<Vec<ProtectionStatus>, HearthError> {
        let listings = match url {
            Some(url) => vec![self.get(url)?],
            None => self.store.all()?,
        };
        let engine = self.engine();
        let mut statuses = Vec::with_capacity(listings.len());
        for listing in listings {
            let protected_fields = engine.protected_fields(&listing)?;
            statuses.push(ProtectionStatus {
                url: listing.url,
                protected_fields,
            });
        }
        Ok(statuses)
    }

    /// Raw ledger entries, optionally scoped to one identity.
    pub fn ledger_status(&self, url: Option<&str>) -> Result<Vec<LedgerEntry>, HearthError> {
        Ok(self.ledger.status(url)?)
    }

    /// Remove fingerprints so the next reconciliation treats the fields as
    /// untouched.
    pub fn ledger_reset(
        &self,
        url: &str,
        fields: Option<&[Field]>,
    ) -> Result<usize, HearthError> {
        Ok(self.ledger.reset(url, fields)?)
    }

    /// Force-protect fields of a record.
    ///
    /// Protection is explicit user intent, so it applies even to fields that
    /// are empty on the stored record; those are reported back for a warning.
    pub fn ledger_protect(&self, url: &str, fields: &[Field]) -> Result<ProtectReport, HearthError> {
        let stored = self.store.get(url)?;
        let empty_fields = match &stored {
            Some(listing) => fields
                .iter()
                .copied()
                .filter(|f| listing.field_is_empty(*f))
                .collect(),
            None => Vec::new(),
        };
        if stored.is_none() {
            warn!(url = %url, "Protecting fields of an identity with no stored record");
        }
        for field in &empty_fields {
            warn!(url = %url, field = %field, "Protecting a field that is empty on the stored record");
        }
        let marked = self.ledger.protect(url, fields)?;
        Ok(ProtectReport {
            marked,
            empty_fields,
            missing_record: stored.is_none(),
        })
    }

    pub fn cache_statistics(&self) -> Result<CacheStatistics, HearthError> {
        Ok(self.cache.statistics()?)
    }

    /// Remove cache entries older than the given window, returning the count.
    pub fn cache_purge(&self, max_age: Duration) -> Result<usize, HearthError> {
        Ok(self.cache.purge_older_than(max_age)?)
    }

    pub fn cache_clear(&self) -> Result<usize, HearthError> {
        Ok(self.cache.clear()?)
    }

    pub fn cache_max_age(&self) -> Duration {
        self.options.cache_max_age
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.names()
    }
}

fn validate_url(url: &str) -> Result<&str, HearthError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(HearthError::Validation("URL is empty".to_string()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(HearthError::Validation(format!(
            "URL must start with http:// or https://: {}",
            trimmed
        )));
    }
    Ok(trimmed)
}
