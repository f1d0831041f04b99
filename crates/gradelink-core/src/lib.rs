// ============================================
// File: crates/gradelink-core/src/lib.rs
// ============================================
//! # Gradelink Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the wire protocol and the record-key cryptography shared by the
//! Gradelink server and client. Both peers derive the same key from their own
//! copy of the backing store, so everything that must agree byte-for-byte
//! lives here.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - `Command`: closed set of request intents
//! - `Request`: fixed-width identifier + command token
//! - `Payload`: average or full record, as sent inside the token
//! - Codec for requests and response payloads
//!
//! ### Crypto Module ([`crypto`])
//! - `RecordKey`: key material taken from a record's key column
//! - Self-contained ChaCha20-Poly1305 response tokens
//!
//! ## Data Flow
//! ```text
//! client                                             server
//!   │ encode_request(id, cmd) ──────────────────────► │ decode_request
//!   │                                                 │ lookup + dispatch
//!   │                                                 │ encode_response
//!   │ ◄────────────────────────────── encrypt(key, …) │
//!   │ decrypt(key, …)                                 │
//!   │ decode_response                                 │
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL cryptographic code uses RustCrypto implementations
//! - Request framing has no delimiter: the identifier width IS the framing
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{decrypt, decrypt_with_ttl, encrypt, RecordKey, TokenCipher};
pub use error::{CoreError, Result};
pub use protocol::{Command, Payload, Request};
