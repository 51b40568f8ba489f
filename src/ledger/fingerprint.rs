//! Field value fingerprinting
//!
//! Fingerprints are short, deterministic digests of a field's textual value.
//! The ledger compares the stored fingerprint against the fingerprint of the
//! stored value to detect manual edits, so the only properties that matter
//! are determinism and a negligible collision rate at this length.

/// Length of a rendered fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Compute the fingerprint of a field value.
///
/// Hashes a domain discriminator, the value length as big-endian bytes, and
/// the value itself, then renders the first 8 digest bytes as lowercase hex.
pub fn fingerprint_of(value: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"field-value");
    hasher.update(&(value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest.as_bytes()[..FINGERPRINT_HEX_LEN / 2])
}
