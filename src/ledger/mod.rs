//! Field hash ledger
//!
//! The ledger records, per (listing, field), the fingerprint of the value the
//! automation last wrote. A field whose stored value no longer matches its
//! ledger fingerprint was edited by a human, and reconciliation must not
//! overwrite it. The ledger is the only component that knows this rule.

pub mod fingerprint;
pub mod persistence;

pub use fingerprint::{fingerprint_of, FINGERPRINT_HEX_LEN};
pub use persistence::SledFieldLedger;

use crate::error::StorageError;
use crate::listing::Field;
use serde::{Deserialize, Serialize};

/// Marker stored in place of a fingerprint to force protection.
///
/// Not valid hex, so it can never collide with a real fingerprint and always
/// compares unequal to the stored value's digest.
pub const PROTECT_SENTINEL: &str = "protected";

/// Persisted ledger value for one (identity, field) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub fingerprint: String,
    /// Epoch milliseconds of the last ledger write for this pair.
    pub updated_at_ms: u64,
}

impl FingerprintRecord {
    /// Whether this record is a forced-protection marker rather than a digest.
    pub fn is_sentinel(&self) -> bool {
        self.fingerprint == PROTECT_SENTINEL
    }
}

/// One row of a ledger status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub identity: String,
    pub field: Field,
    pub fingerprint: String,
    pub updated_at_ms: u64,
}

impl LedgerEntry {
    pub fn is_sentinel(&self) -> bool {
        self.fingerprint == PROTECT_SENTINEL
    }
}

/// Persistent store of field fingerprints, keyed by (identity, field).
///
/// Identities are listing URLs. Ledger failures are fatal for the affected
/// identity: a reconciliation that cannot read or write fingerprints would
/// silently clobber manual edits, so callers must stop instead.
pub trait FieldLedger: Send + Sync {
    /// Record the fingerprint of `value` as the last automated write.
    fn record_fingerprint(
        &self,
        identity: &str,
        field: Field,
        value: &str,
    ) -> Result<(), StorageError>;

    /// Force protection of fields by storing the sentinel marker.
    ///
    /// Overwrites any existing fingerprint for each pair; takes effect
    /// immediately. Returns the number of fields marked.
    fn protect(&self, identity: &str, fields: &[Field]) -> Result<usize, StorageError>;

    /// Fetch the ledger record for a pair, if any.
    fn fingerprint_for(
        &self,
        identity: &str,
        field: Field,
    ) -> Result<Option<FingerprintRecord>, StorageError>;

    /// Whether the stored value diverges from the last automated write.
    ///
    /// A pair with no ledger record is unprotected. A recorded fingerprint
    /// that no longer matches the stored value means a human edited the
    /// field since the automation last wrote it.
    fn is_protected(
        &self,
        identity: &str,
        field: Field,
        stored_value: &str,
    ) -> Result<bool, StorageError> {
        let Some(record) = self.fingerprint_for(identity, field)? else {
            return Ok(false);
        };
        Ok(record.fingerprint != fingerprint_of(stored_value))
    }

    /// Remove ledger records for an identity.
    ///
    /// With `fields` given, removes only those pairs; with `None`, removes
    /// every record for the identity. Returns the number removed.
    fn reset(&self, identity: &str, fields: Option<&[Field]>) -> Result<usize, StorageError>;

    /// List ledger records, scoped to one identity or across all of them.
    fn status(&self, identity: Option<&str>) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Remove every record in the ledger, returning the removed count.
    fn clear_all(&self) -> Result<usize, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_not_hex() {
        assert!(!PROTECT_SENTINEL.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(PROTECT_SENTINEL.len(), FINGERPRINT_HEX_LEN);
    }

    #[test]
    fn test_record_sentinel_detection() {
        let record = FingerprintRecord {
            fingerprint: PROTECT_SENTINEL.to_string(),
            updated_at_ms: 0,
        };
        assert!(record.is_sentinel());

        let record = FingerprintRecord {
            fingerprint: fingerprint_of("value"),
            updated_at_ms: 0,
        };
        assert!(!record.is_sentinel());
    }
}
