// ============================================
// File: crates/gradelink-core/src/crypto/token.rs
// ============================================
//! # Response Tokens
//!
//! ## Creation Reason
//! Seals a response payload under a record key as a self-contained,
//! authenticated, ASCII-safe token.
//!
//! ## Main Functionality
//! - `TokenCipher`: Trait for sealing and opening tokens
//! - `DefaultTokenCipher`: ChaCha20-Poly1305 implementation
//! - `encrypt` / `decrypt` / `decrypt_with_ttl`: convenience functions
//!
//! ## Token Format
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Version (1 byte, 0xA1)         │ ← AAD (authenticated)     │
//! │ Issued At (8 bytes BE, secs)   │ ← AAD (authenticated)     │
//! ├────────────────────────────────────────────────────────────┤
//! │ Nonce (12 bytes, random)       │                           │
//! ├────────────────────────────────────────────────────────────┤
//! │ Encrypted Payload (variable)   │ ← ChaCha20 ciphertext     │
//! │ └─ Poly1305 Tag (16 bytes)     │ ← Authentication tag      │
//! └────────────────────────────────────────────────────────────┘
//!            whole token is URL-safe base64 encoded
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The nonce is random per token; one record key seals many responses,
//!   so a counter nonce would repeat across server restarts
//! - Authentication is checked BEFORE the TTL, so an altered timestamp is a
//!   `Decryption` error, never `TokenExpired`
//!
//! ## Last Modified
//! v0.1.0 - Initial token cipher implementation

use base64::{engine::general_purpose::URL_SAFE, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use gradelink_common::time::Timestamp;

use super::keys::RecordKey;
use super::{CHACHA20_NONCE_SIZE, POLY1305_TAG_SIZE, TOKEN_VERSION};
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Length of the authenticated header (version + issued-at).
const HEADER_SIZE: usize = 1 + 8;

/// Smallest decoded token: header, nonce and tag around an empty payload.
pub const MIN_TOKEN_SIZE: usize = HEADER_SIZE + CHACHA20_NONCE_SIZE + POLY1305_TAG_SIZE;

/// Accepted clock skew for tokens issued "in the future".
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

// ============================================
// TokenCipher Trait
// ============================================

/// Trait for response token operations.
///
/// # Purpose
/// Abstracts token sealing so that the session layer can be tested with a
/// fixed clock or an alternative cipher suite.
pub trait TokenCipher: Send + Sync {
    /// Seals `plaintext` under `key`, stamping it with `issued_at`.
    ///
    /// # Errors
    /// - `Encryption`: if the AEAD refuses the input
    fn seal(&self, key: &RecordKey, issued_at: Timestamp, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Opens a token, returning its issue time and plaintext.
    ///
    /// # Errors
    /// - `MalformedToken`: not base64, too short, or unknown version
    /// - `Decryption`: wrong key or altered token
    fn open(&self, key: &RecordKey, token: &[u8]) -> Result<(Timestamp, Vec<u8>)>;
}

// ============================================
// DefaultTokenCipher
// ============================================

/// Default implementation using ChaCha20-Poly1305.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTokenCipher;

impl DefaultTokenCipher {
    /// Creates a new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn header(issued_at: Timestamp) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0] = TOKEN_VERSION;
        header[1..].copy_from_slice(&issued_at.to_be_bytes());
        header
    }

    fn cipher(key: &RecordKey) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| CoreError::Encryption {
            context: "Failed to create cipher".into(),
        })
    }
}

impl TokenCipher for DefaultTokenCipher {
    fn seal(&self, key: &RecordKey, issued_at: Timestamp, plaintext: &[u8]) -> Result<Vec<u8>> {
        let header = Self::header(issued_at);

        let mut nonce = [0u8; CHACHA20_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = Self::cipher(key)?
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| CoreError::Encryption {
                context: "ChaCha20-Poly1305 encryption failed".into(),
            })?;

        let mut raw = Vec::with_capacity(HEADER_SIZE + CHACHA20_NONCE_SIZE + ciphertext.len());
        raw.extend_from_slice(&header);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);

        Ok(URL_SAFE.encode(raw).into_bytes())
    }

    fn open(&self, key: &RecordKey, token: &[u8]) -> Result<(Timestamp, Vec<u8>)> {
        let raw = URL_SAFE
            .decode(token)
            .map_err(|_| CoreError::malformed_token("not URL-safe base64"))?;

        if raw.len() < MIN_TOKEN_SIZE {
            return Err(CoreError::malformed_token(format!(
                "expected at least {MIN_TOKEN_SIZE} bytes, got {}",
                raw.len()
            )));
        }
        if raw[0] != TOKEN_VERSION {
            return Err(CoreError::malformed_token(format!(
                "unknown version 0x{:02x}",
                raw[0]
            )));
        }

        let (header, rest) = raw.split_at(HEADER_SIZE);
        let (nonce, ciphertext) = rest.split_at(CHACHA20_NONCE_SIZE);

        let mut issued = [0u8; 8];
        issued.copy_from_slice(&header[1..]);

        let plaintext = Self::cipher(key)?
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| CoreError::Decryption)?;

        Ok((Timestamp::from_be_bytes(issued), plaintext))
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Seals `plaintext` under `key`, stamped with the current time.
///
/// # Errors
/// See [`TokenCipher::seal`].
pub fn encrypt(key: &RecordKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    DefaultTokenCipher.seal(key, Timestamp::now(), plaintext)
}

/// Opens a token regardless of its age.
///
/// # Errors
/// See [`TokenCipher::open`].
pub fn decrypt(key: &RecordKey, token: &[u8]) -> Result<Vec<u8>> {
    DefaultTokenCipher.open(key, token).map(|(_, plaintext)| plaintext)
}

/// Opens a token and rejects it if it is older than `ttl_secs`, or issued
/// more than [`MAX_CLOCK_SKEW_SECS`] in the future.
///
/// # Errors
/// - See [`TokenCipher::open`]
/// - `TokenExpired`: authentic but outside the accepted window
pub fn decrypt_with_ttl(key: &RecordKey, token: &[u8], ttl_secs: u64) -> Result<Vec<u8>> {
    let (issued_at, plaintext) = DefaultTokenCipher.open(key, token)?;
    check_age(issued_at, Timestamp::now(), ttl_secs)?;
    Ok(plaintext)
}

fn check_age(issued_at: Timestamp, now: Timestamp, ttl_secs: u64) -> Result<()> {
    let expired = || CoreError::TokenExpired {
        issued_at: issued_at.as_secs(),
        ttl_secs,
    };

    match now.as_secs().checked_sub(issued_at.as_secs()) {
        Some(age) if age > ttl_secs => Err(expired()),
        Some(_) => Ok(()),
        None if issued_at.as_secs() - now.as_secs() > MAX_CLOCK_SKEW_SECS => Err(expired()),
        None => Ok(()),
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> RecordKey {
        RecordKey::from_field(text).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let k = key("k1");
        let token = encrypt(&k, b"75").unwrap();
        assert_eq!(decrypt(&k, &token).unwrap(), b"75");
    }

    #[test]
    fn test_token_is_ascii() {
        let token = encrypt(&key("k1"), b"S,1000000,k1,80,70,90,60,75,88,92,77,65").unwrap();
        assert!(token.iter().all(u8::is_ascii_graphic));
    }

    #[test]
    fn test_tokens_differ_per_call() {
        let k = key("k1");
        let a = encrypt(&k, b"75").unwrap();
        let b = encrypt(&k, b"75").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let token = encrypt(&key("k1"), b"75").unwrap();
        assert!(matches!(
            decrypt(&key("k2"), &token),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn test_tampered_token_fails_authentication() {
        let k = key("k1");
        let token = encrypt(&k, b"75").unwrap();
        let mut raw = URL_SAFE.decode(&token).unwrap();

        // Flip a ciphertext bit.
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let altered = URL_SAFE.encode(&raw).into_bytes();
        assert!(matches!(decrypt(&k, &altered), Err(CoreError::Decryption)));

        // Rewrite the timestamp (authenticated header).
        let mut raw = URL_SAFE.decode(&token).unwrap();
        raw[8] ^= 0x01;
        let altered = URL_SAFE.encode(&raw).into_bytes();
        assert!(matches!(decrypt(&k, &altered), Err(CoreError::Decryption)));
    }

    #[test]
    fn test_malformed_tokens() {
        let k = key("k1");
        assert!(matches!(
            decrypt(&k, b"not base64 !!"),
            Err(CoreError::MalformedToken { .. })
        ));
        assert!(matches!(
            decrypt(&k, URL_SAFE.encode([TOKEN_VERSION; 10]).as_bytes()),
            Err(CoreError::MalformedToken { .. })
        ));

        let mut raw = URL_SAFE.decode(encrypt(&k, b"75").unwrap()).unwrap();
        raw[0] = 0x80;
        assert!(matches!(
            decrypt(&k, URL_SAFE.encode(&raw).as_bytes()),
            Err(CoreError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_issue_time_is_recorded() {
        let k = key("k1");
        let issued = Timestamp::from_secs(1_700_000_000);
        let token = DefaultTokenCipher::new().seal(&k, issued, b"90").unwrap();
        let (at, plaintext) = DefaultTokenCipher::new().open(&k, &token).unwrap();
        assert_eq!(at, issued);
        assert_eq!(plaintext, b"90");
    }

    #[test]
    fn test_ttl() {
        let k = key("k1");
        let fresh = encrypt(&k, b"75").unwrap();
        assert_eq!(decrypt_with_ttl(&k, &fresh, 60).unwrap(), b"75");

        let stale = DefaultTokenCipher
            .seal(&k, Timestamp::from_secs(1_000), b"75")
            .unwrap();
        assert!(matches!(
            decrypt_with_ttl(&k, &stale, 60),
            Err(CoreError::TokenExpired { issued_at: 1_000, ttl_secs: 60 })
        ));
        // Without a TTL, age does not matter.
        assert_eq!(decrypt(&k, &stale).unwrap(), b"75");
    }

    #[test]
    fn test_check_age_window() {
        let now = Timestamp::from_secs(10_000);
        assert!(check_age(Timestamp::from_secs(10_000), now, 0).is_ok());
        assert!(check_age(Timestamp::from_secs(9_940), now, 60).is_ok());
        assert!(check_age(Timestamp::from_secs(9_939), now, 60).is_err());
        assert!(check_age(Timestamp::from_secs(10_060), now, 60).is_ok());
        assert!(check_age(Timestamp::from_secs(10_061), now, 60).is_err());
    }
}
