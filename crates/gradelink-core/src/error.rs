// ============================================
// File: crates/gradelink-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types specific to protocol framing and record-key
//! cryptography in the Gradelink core crate.
//!
//! ## Error Categories
//! 1. **Protocol Errors**: request framing, response parsing
//! 2. **Crypto Errors**: key material, sealing, authentication failure
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or plaintext in error messages
//! - `Decryption` must stay distinguishable from every other variant;
//!   callers rely on it to tell a wrong key from a broken token
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use gradelink_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Protocol Errors
    // ========================================

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// The `Invalid` command has no wire token.
    #[error("Command cannot be encoded: {command}")]
    UnencodableCommand {
        /// Debug name of the command
        command: String,
    },

    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Key column text cannot be used as key material.
    #[error("Invalid record key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Key derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Decryption failed (wrong key or altered token).
    #[error("Decryption failed: authentication error")]
    Decryption,

    /// Token is not structurally valid.
    #[error("Malformed token: {reason}")]
    MalformedToken {
        /// What's wrong with the token
        reason: String,
    },

    /// Token is older than the accepted TTL or issued in the future.
    #[error("Token expired: issued at {issued_at}, ttl {ttl_secs}s")]
    TokenExpired {
        /// Unix seconds the token was issued at
        issued_at: u64,
        /// Accepted age in seconds
        ttl_secs: u64,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    #[must_use]
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates an `InvalidKey` error.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedToken` error.
    pub fn malformed_token(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::KeyDerivation { .. }
                | Self::Encryption { .. }
                | Self::Decryption
                | Self::MalformedToken { .. }
                | Self::TokenExpired { .. }
        )
    }

    /// Returns `true` if this is a protocol framing error.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage { .. }
                | Self::MessageTooShort { .. }
                | Self::UnencodableCommand { .. }
        )
    }

    /// Returns `true` if this error might indicate tampering.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::Decryption | Self::MalformedToken { .. })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::too_short(7, 3);
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('3'));

        assert!(CoreError::Decryption.to_string().contains("authentication"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::Decryption.is_crypto_error());
        assert!(CoreError::Decryption.is_suspicious());
        assert!(!CoreError::Decryption.is_protocol_error());

        let framing = CoreError::malformed("non-ASCII identifier");
        assert!(framing.is_protocol_error());
        assert!(!framing.is_crypto_error());
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_input("field", "bad value");
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
    }
}
