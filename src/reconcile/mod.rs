//! Reconciliation engine
//!
//! Merges a freshly scraped candidate record with the previously stored
//! record for the same identity, field by field, without clobbering values a
//! human edited. Protection is decided by the field ledger: a stored value
//! whose fingerprint no longer matches the ledger's last-recorded one was
//! edited out-of-band and must be kept.
//!
//! The engine never persists records itself. It returns the merged record
//! and per-field dispositions; storing the result is the caller's job. It
//! does write the ledger, since fingerprints must track every automated
//! value it decides to keep.

pub mod batch;

pub use batch::{BatchDriver, BatchPolicy, BatchReport, IdentityOutcome};

use crate::error::StorageError;
use crate::ledger::FieldLedger;
use crate::listing::{now_rfc3339, Field, Listing};
use std::sync::Arc;
use tracing::debug;

/// What happened to one field during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDisposition {
    /// Candidate value applied and fingerprinted.
    Adopted,
    /// Prior value kept because the field is protected.
    KeptProtected,
    /// Candidate omitted the field; prior value kept and re-fingerprinted.
    KeptMissing,
    /// Timestamp refreshed to the reconciliation time.
    Refreshed,
    /// Identity never changes after creation.
    Immutable,
}

/// Result of reconciling one identity.
#[derive(Debug, Clone)]
pub struct Merged {
    pub listing: Listing,
    pub dispositions: Vec<(Field, FieldDisposition)>,
    /// True when no prior record existed.
    pub created: bool,
    /// Fields whose stored value actually changed, timestamp excluded.
    pub adopted_changed: usize,
    /// Protected fields where a differing candidate value was discarded.
    pub kept_protected: usize,
}

impl Merged {
    pub fn disposition(&self, field: Field) -> Option<FieldDisposition> {
        self.dispositions
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, d)| *d)
    }
}

/// Field-by-field merge of candidate records against stored ones.
pub struct ReconcileEngine {
    ledger: Arc<dyn FieldLedger>,
}

impl ReconcileEngine {
    pub fn new(ledger: Arc<dyn FieldLedger>) -> Self {
        ReconcileEngine { ledger }
    }

    /// Merge `candidate` into the stored record, honoring protection.
    pub fn reconcile(
        &self,
        identity: &str,
        prior: Option<&Listing>,
        candidate: Listing,
    ) -> Result<Merged, StorageError> {
        self.merge(identity, prior, candidate, false)
    }

    /// Merge with all protection bypassed: every candidate field is adopted
    /// verbatim and re-fingerprinted, manual notes included. Identity and
    /// timestamp rules still apply.
    pub fn reconcile_forced(
        &self,
        identity: &str,
        prior: Option<&Listing>,
        candidate: Listing,
    ) -> Result<Merged, StorageError> {
        self.merge(identity, prior, candidate, true)
    }

    fn merge(
        &self,
        identity: &str,
        prior: Option<&Listing>,
        candidate: Listing,
        ignore_protection: bool,
    ) -> Result<Merged, StorageError> {
        let created = prior.is_none();
        let mut merged = match prior {
            Some(p) => p.clone(),
            None => Listing::new(identity),
        };
        let mut dispositions = Vec::with_capacity(Field::ALL.len());
        let mut adopted_changed = 0;
        let mut kept_protected = 0;

        for field in Field::ALL {
            let disposition = match field {
                Field::ScrapedAt => {
                    merged.scraped_at = now_rfc3339();
                    FieldDisposition::Refreshed
                }
                Field::Url => {
                    if created {
                        merged.url = identity.to_string();
                        self.ledger.record_fingerprint(identity, field, identity)?;
                        FieldDisposition::Adopted
                    } else {
                        FieldDisposition::Immutable
                    }
                }
                _ => self.merge_field(identity, prior, &candidate, &mut merged, field, ignore_protection)?,
            };

            match disposition {
                FieldDisposition::Adopted => {
                    let changed = match prior {
                        Some(p) => merged.field_text(field) != p.field_text(field),
                        None => !merged.field_is_empty(field),
                    };
                    if changed {
                        adopted_changed += 1;
                    }
                }
                FieldDisposition::KeptProtected => {
                    if let Some(p) = prior {
                        if candidate.field_text(field) != p.field_text(field) {
                            kept_protected += 1;
                        }
                    }
                }
                _ => {}
            }

            debug!(identity = %identity, field = %field, disposition = ?disposition, "Field merged");
            dispositions.push((field, disposition));
        }

        Ok(Merged {
            listing: merged,
            dispositions,
            created,
            adopted_changed,
            kept_protected,
        })
    }

    /// Fields of a stored record that a reconciliation would refuse to
    /// overwrite: ledger mismatches plus non-empty notes and decisions.
    pub fn protected_fields(&self, listing: &Listing) -> Result<Vec<Field>, StorageError> {
        let mut protected = Vec::new();
        for field in Field::ALL {
            if matches!(field, Field::Url | Field::ScrapedAt) {
                continue;
            }
            let human_owned = matches!(field, Field::Notes | Field::Decision);
            if human_owned && !listing.field_is_empty(field) {
                protected.push(field);
                continue;
            }
            if self
                .ledger
                .is_protected(&listing.url, field, &listing.field_text(field))?
            {
                protected.push(field);
            }
        }
        Ok(protected)
    }

    fn merge_field(
        &self,
        identity: &str,
        prior: Option<&Listing>,
        candidate: &Listing,
        merged: &mut Listing,
        field: Field,
        ignore_protection: bool,
    ) -> Result<FieldDisposition, StorageError> {
        let Some(prior) = prior else {
            // First time seeing this identity: adopt verbatim.
            merged.copy_field(candidate, field);
            self.ledger
                .record_fingerprint(identity, field, &merged.field_text(field))?;
            return Ok(FieldDisposition::Adopted);
        };

        if ignore_protection {
            merged.copy_field(candidate, field);
            self.ledger
                .record_fingerprint(identity, field, &merged.field_text(field))?;
            return Ok(FieldDisposition::Adopted);
        }

        // Notes and decisions are human territory: once set, no candidate
        // overwrites them no matter what the ledger says.
        let human_owned = matches!(field, Field::Notes | Field::Decision);
        if human_owned && !prior.field_is_empty(field) {
            return Ok(FieldDisposition::KeptProtected);
        }

        let stored_value = prior.field_text(field);
        if self.ledger.is_protected(identity, field, &stored_value)? {
            // The mismatch persists until explicitly reset.
            return Ok(FieldDisposition::KeptProtected);
        }

        if candidate.field_is_empty(field) {
            // Candidate omitted the field; keep what we have and bring the
            // ledger in line with the stored result.
            self.ledger
                .record_fingerprint(identity, field, &merged.field_text(field))?;
            return Ok(FieldDisposition::KeptMissing);
        }

        merged.copy_field(candidate, field);
        self.ledger
            .record_fingerprint(identity, field, &merged.field_text(field))?;
        Ok(FieldDisposition::Adopted)
    }
}
