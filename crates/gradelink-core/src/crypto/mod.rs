// ============================================
// File: crates/gradelink-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes the record-key cryptography for Gradelink, using audited
//! RustCrypto implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: `RecordKey`, taken from a record's key column
//! - [`kdf`]: Key expansion for short key text (HKDF-SHA256)
//! - [`token`]: Self-contained response tokens (ChaCha20-Poly1305)
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  key column text                                            │
//! │     │                                                       │
//! │     ├─ URL-safe base64 of 32 bytes ──► used directly        │
//! │     └─ anything else ──► HKDF-SHA256 ──► 32 bytes           │
//! │                                   │                         │
//! │                                   ▼                         │
//! │   RecordKey + random nonce ──► ChaCha20-Poly1305 ──► token  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Server and client never exchange keys: each derives the key from its own
//! copy of the backing store, so a mismatched copy shows up as a
//! `Decryption` error on the client.
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL implementations use RustCrypto (audited)
//! - `RecordKey` implements Zeroize; do not copy its bytes around
//! - Changing the salt, info or token version breaks every existing client
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod kdf;
pub mod keys;
pub mod token;

// Re-export primary types at module level
pub use keys::RecordKey;
pub use token::{decrypt, decrypt_with_ttl, encrypt, DefaultTokenCipher, TokenCipher};

// ============================================
// Constants
// ============================================

/// Size of ChaCha20-Poly1305 key in bytes.
pub const CHACHA20_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 nonce in bytes.
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// Size of Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// Leading byte of every token.
pub const TOKEN_VERSION: u8 = 0xA1;

/// HKDF salt for record key expansion.
pub const HKDF_SALT: &[u8] = b"gradelink-v1";

/// HKDF info for record key expansion.
pub const HKDF_INFO: &[u8] = b"gradelink-record-key";
