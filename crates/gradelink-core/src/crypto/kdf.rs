// ============================================
// File: crates/gradelink-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Main Functionality
//! - `expand_text_key`: stretches arbitrary key text to a cipher key
//! - `hkdf_expand`: generic HKDF-SHA256 helper underneath it
//!
//! ## Last Modified
//! v0.1.0 - Initial KDF implementation

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use super::{CHACHA20_KEY_SIZE, HKDF_INFO, HKDF_SALT};
use crate::error::{CoreError, Result};

// ============================================
// Key Derivation
// ============================================

/// Expands key column text into 32 bytes of key material.
///
/// ```text
/// key = HKDF-SHA256(
///     ikm:  key text bytes,
///     salt: "gradelink-v1",
///     info: "gradelink-record-key"
/// )
/// ```
///
/// # Errors
/// `KeyDerivation` if HKDF rejects the output length (cannot happen for 32).
pub fn expand_text_key(text: &str) -> Result<[u8; CHACHA20_KEY_SIZE]> {
    let mut expanded = hkdf_expand(text.as_bytes(), HKDF_SALT, HKDF_INFO, CHACHA20_KEY_SIZE)?;
    let key_bytes = <[u8; CHACHA20_KEY_SIZE]>::try_from(expanded.as_slice()).map_err(|_| {
        CoreError::KeyDerivation {
            reason: format!("expected {CHACHA20_KEY_SIZE} bytes, got {}", expanded.len()),
        }
    });
    expanded.zeroize();

    key_bytes
}

/// Derives `output_len` bytes from `ikm` with the given salt and info.
///
/// # Errors
/// `KeyDerivation` if `output_len` exceeds the HKDF-SHA256 maximum
/// (255 * 32 bytes).
pub fn hkdf_expand(ikm: &[u8], salt: &[u8], info: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut output = vec![0u8; output_len];
    hk.expand(info, &mut output)
        .map_err(|_| CoreError::KeyDerivation {
            reason: format!("HKDF expansion failed for {output_len} bytes"),
        })?;

    Ok(output)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_is_deterministic() {
        let a = expand_text_key("k1").unwrap();
        let b = expand_text_key("k1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_text_different_keys() {
        let a = expand_text_key("k1").unwrap();
        let b = expand_text_key("k2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expand_text_key_matches_generic_helper() {
        let direct = expand_text_key("k1").unwrap();
        let generic = hkdf_expand(b"k1", HKDF_SALT, HKDF_INFO, CHACHA20_KEY_SIZE).unwrap();
        assert_eq!(direct.as_slice(), generic.as_slice());
    }

    #[test]
    fn test_hkdf_expand_rejects_oversized_output() {
        let result = hkdf_expand(b"ikm", b"salt", b"info", 255 * 32 + 1);
        assert!(matches!(result, Err(CoreError::KeyDerivation { .. })));
    }
}
