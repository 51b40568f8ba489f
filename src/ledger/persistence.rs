//! Sled-backed field ledger

use crate::error::StorageError;
use crate::ledger::{
    fingerprint_of, FieldLedger, FingerprintRecord, LedgerEntry, PROTECT_SENTINEL,
};
use crate::listing::{now_millis, Field};
use sled::{Db, Tree};
use std::io;
use std::str::FromStr;
use tracing::{debug, warn};

const TREE_FIELD_LEDGER: &str = "field_ledger";

/// Separator between identity and field name in ledger keys.
///
/// URLs and field names never contain a NUL byte, so the split is unambiguous.
const KEY_SEPARATOR: u8 = 0;

/// Field ledger persisted in a named tree of a shared sled database.
pub struct SledFieldLedger {
    tree: Tree,
}

impl SledFieldLedger {
    /// Open the ledger tree inside an already-open database.
    pub fn open(db: &Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_FIELD_LEDGER).map_err(to_storage_io)?;
        Ok(SledFieldLedger { tree })
    }

    fn put_record(&self, identity: &str, field: Field, fingerprint: String) -> Result<(), StorageError> {
        let record = FingerprintRecord {
            fingerprint,
            updated_at_ms: now_millis(),
        };
        let raw = serde_json::to_vec(&record).map_err(to_storage_data)?;
        self.tree
            .insert(ledger_key(identity, field), raw)
            .map_err(to_storage_io)?;
        Ok(())
    }

    fn entries_matching(&self, identity: Option<&str>) -> Result<Vec<LedgerEntry>, StorageError> {
        let mut entries = Vec::new();
        let iter: Box<dyn Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>> =
            match identity {
                Some(identity) => Box::new(self.tree.scan_prefix(identity_prefix(identity))),
                None => Box::new(self.tree.iter()),
            };
        for item in iter {
            let (key, raw) = item.map_err(to_storage_io)?;
            let Some((entry_identity, field)) = parse_ledger_key(&key) else {
                warn!("Skipping ledger entry with unreadable key");
                continue;
            };
            let record: FingerprintRecord = serde_json::from_slice(&raw).map_err(|err| {
                StorageError::CorruptEntry(format!(
                    "ledger record for {} field {}: {}",
                    entry_identity, field, err
                ))
            })?;
            entries.push(LedgerEntry {
                identity: entry_identity,
                field,
                fingerprint: record.fingerprint,
                updated_at_ms: record.updated_at_ms,
            });
        }
        entries.sort_by(|a, b| {
            a.identity
                .cmp(&b.identity)
                .then_with(|| a.field.as_str().cmp(b.field.as_str()))
        });
        Ok(entries)
    }
}

impl FieldLedger for SledFieldLedger {
    fn record_fingerprint(
        &self,
        identity: &str,
        field: Field,
        value: &str,
    ) -> Result<(), StorageError> {
        self.put_record(identity, field, fingerprint_of(value))?;
        debug!(identity = %identity, field = %field, "Recorded field fingerprint");
        Ok(())
    }

    fn protect(&self, identity: &str, fields: &[Field]) -> Result<usize, StorageError> {
        for field in fields {
            self.put_record(identity, *field, PROTECT_SENTINEL.to_string())?;
            debug!(identity = %identity, field = %field, "Marked field as protected");
        }
        Ok(fields.len())
    }

    fn fingerprint_for(
        &self,
        identity: &str,
        field: Field,
    ) -> Result<Option<FingerprintRecord>, StorageError> {
        let Some(raw) = self
            .tree
            .get(ledger_key(identity, field))
            .map_err(to_storage_io)?
        else {
            return Ok(None);
        };
        let record: FingerprintRecord = serde_json::from_slice(&raw).map_err(|err| {
            StorageError::CorruptEntry(format!(
                "ledger record for {} field {}: {}",
                identity, field, err
            ))
        })?;
        Ok(Some(record))
    }

    fn reset(&self, identity: &str, fields: Option<&[Field]>) -> Result<usize, StorageError> {
        let mut removed = 0;
        match fields {
            Some(fields) => {
                for field in fields {
                    if self
                        .tree
                        .remove(ledger_key(identity, *field))
                        .map_err(to_storage_io)?
                        .is_some()
                    {
                        removed += 1;
                    }
                }
            }
            None => {
                let mut keys = Vec::new();
                for item in self.tree.scan_prefix(identity_prefix(identity)) {
                    let (key, _) = item.map_err(to_storage_io)?;
                    keys.push(key);
                }
                for key in keys {
                    if self.tree.remove(key).map_err(to_storage_io)?.is_some() {
                        removed += 1;
                    }
                }
            }
        }
        debug!(identity = %identity, removed, "Reset ledger records");
        Ok(removed)
    }

    fn status(&self, identity: Option<&str>) -> Result<Vec<LedgerEntry>, StorageError> {
        self.entries_matching(identity)
    }

    fn clear_all(&self) -> Result<usize, StorageError> {
        let count = self.tree.len();
        self.tree.clear().map_err(to_storage_io)?;
        Ok(count)
    }
}

fn ledger_key(identity: &str, field: Field) -> Vec<u8> {
    let field_name = field.as_str().as_bytes();
    let mut key = Vec::with_capacity(identity.len() + 1 + field_name.len());
    key.extend_from_slice(identity.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(field_name);
    key
}

fn identity_prefix(identity: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(identity.len() + 1);
    prefix.extend_from_slice(identity.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

fn parse_ledger_key(key: &[u8]) -> Option<(String, Field)> {
    let split = key.iter().position(|&b| b == KEY_SEPARATOR)?;
    let identity = String::from_utf8(key[..split].to_vec()).ok()?;
    let field_name = std::str::from_utf8(&key[split + 1..]).ok()?;
    let field = Field::from_str(field_name).ok()?;
    Some((identity, field))
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::SerializationFailed(err.to_string())
}
