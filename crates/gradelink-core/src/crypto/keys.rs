// ============================================
// File: crates/gradelink-core/src/crypto/keys.rs
// ============================================
//! # Record Key
//!
//! ## Creation Reason
//! Turns the key column of a store row into cipher key material. Both peers
//! run the same derivation over their own copy of the row.
//!
//! ## Accepted Key Forms
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ "q2Gm...VwA=" (URL-safe base64, decodes to 32 bytes)         │
//! │    └─ decoded bytes are the key                              │
//! │                                                              │
//! │ "k1" (any other non-empty printable text)                    │
//! │    └─ HKDF-SHA256(text) → 32 bytes                           │
//! │                                                              │
//! │ "" or non-printable                                          │
//! │    └─ InvalidKey                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Key text is never used as key bytes as-is. Only a field that decodes
//!   to exactly 32 bytes is taken directly; short keys such as `"k1"` and
//!   any other text are stretched with HKDF, so both peers must share the
//!   salt and info constants to agree on the key
//! - Surrounding whitespace is NOT trimmed; `" k1"` and `"k1"` are different
//!   keys, same as the identifier column
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use gradelink_common::types::{is_printable_ascii, Record};

use super::kdf::expand_text_key;
use super::CHACHA20_KEY_SIZE;
use crate::error::{CoreError, Result};

// ============================================
// RecordKey
// ============================================

/// Symmetric key for one record's responses.
///
/// # Security
/// - Zeroed on drop
/// - Never logged; `Debug` prints a placeholder
///
/// # Example
/// ```
/// use gradelink_core::crypto::RecordKey;
///
/// let key = RecordKey::from_field("k1").unwrap();
/// let again = RecordKey::from_field("k1").unwrap();
/// assert_eq!(key.as_bytes(), again.as_bytes());
/// assert!(RecordKey::from_field("").is_err());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RecordKey([u8; CHACHA20_KEY_SIZE]);

impl RecordKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; CHACHA20_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from key column text.
    ///
    /// # Errors
    /// `InvalidKey` if the text is empty or not printable ASCII.
    pub fn from_field(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(CoreError::invalid_key("key column is empty"));
        }
        if !is_printable_ascii(text.as_bytes()) {
            return Err(CoreError::invalid_key("key column is not printable ASCII"));
        }

        if let Some(bytes) = Self::decode_raw(text) {
            return Ok(Self(bytes));
        }

        expand_text_key(text).map(Self)
    }

    /// Builds the key for a record from its key column.
    ///
    /// # Errors
    /// Same as [`RecordKey::from_field`].
    pub fn derive(record: &Record) -> Result<Self> {
        Self::from_field(&record.key)
    }

    /// Returns the raw key bytes.
    ///
    /// # Security Warning
    /// Do not log or persist the returned bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CHACHA20_KEY_SIZE] {
        &self.0
    }

    fn decode_raw(text: &str) -> Option<[u8; CHACHA20_KEY_SIZE]> {
        let mut decoded = URL_SAFE.decode(text).ok()?;
        let result = <[u8; CHACHA20_KEY_SIZE]>::try_from(decoded.as_slice()).ok();
        decoded.zeroize();
        result
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordKey([REDACTED])")
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_base64_key_is_used_directly() {
        let raw = [7u8; CHACHA20_KEY_SIZE];
        let text = URL_SAFE.encode(raw);
        let key = RecordKey::from_field(&text).unwrap();
        assert_eq!(key.as_bytes(), &raw);
    }

    #[test]
    fn test_short_text_is_expanded() {
        let key = RecordKey::from_field("k1").unwrap();
        assert_eq!(key.as_bytes(), &expand_text_key("k1").unwrap());
    }

    #[test]
    fn test_text_key_is_not_taken_verbatim() {
        let mut padded = [0u8; CHACHA20_KEY_SIZE];
        padded[..2].copy_from_slice(b"k1");
        let key = RecordKey::from_field("k1").unwrap();
        assert_ne!(key.as_bytes(), &padded);
    }

    #[test]
    fn test_base64_of_wrong_length_is_expanded() {
        // Valid base64, but only 3 bytes once decoded.
        let text = URL_SAFE.encode([1u8, 2, 3]);
        let key = RecordKey::from_field(&text).unwrap();
        assert_eq!(key.as_bytes(), &expand_text_key(&text).unwrap());
    }

    #[test]
    fn test_invalid_key_text() {
        assert!(matches!(
            RecordKey::from_field(""),
            Err(CoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            RecordKey::from_field("k\u{1}"),
            Err(CoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            RecordKey::from_field("clé"),
            Err(CoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_whitespace_is_significant() {
        let plain = RecordKey::from_field("k1").unwrap();
        let padded = RecordKey::from_field(" k1").unwrap();
        assert_ne!(plain.as_bytes(), padded.as_bytes());
    }

    #[test]
    fn test_derive_from_record() {
        let record = Record::from_fields([
            "S", "1000000", "k1", "80", "70", "90", "60", "75", "88", "92", "77", "65",
        ])
        .unwrap();
        let key = RecordKey::derive(&record).unwrap();
        assert_eq!(key.as_bytes(), RecordKey::from_field("k1").unwrap().as_bytes());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = RecordKey::from_bytes([0xAB; CHACHA20_KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }
}
