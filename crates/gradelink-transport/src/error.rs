// ============================================
// File: crates/gradelink-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types specific to transport layer operations: listener
//! setup, accepting, connecting, and moving bytes over a stream.
//!
//! ## Error Categories
//! 1. **Listener Errors**: bind, address in use, accept
//! 2. **Connection Errors**: connect, send, receive, oversized response
//! 3. **System Errors**: wrapped I/O errors with context
//!
//! ## ⚠️ Important Note for Next Developer
//! - `is_fatal_to_listener` decides whether the accept loop keeps running;
//!   per-connection failures must never classify as fatal
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use gradelink_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Listener Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    /// Invalid socket address.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    /// Accepting a connection failed.
    #[error("Failed to accept connection: {reason}")]
    AcceptFailed {
        /// OS error kind, used for classification
        kind: io::ErrorKind,
        /// Why accept failed
        reason: String,
    },

    // ========================================
    // Connection Errors
    // ========================================

    /// Outbound connection failed.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Address we tried to reach (host:port)
        addr: String,
        /// Why connecting failed
        reason: String,
    },

    /// Send operation failed.
    #[error("Failed to send to {dest}: {reason}")]
    SendFailed {
        /// Peer address
        dest: SocketAddr,
        /// Why send failed
        reason: String,
    },

    /// Receive operation failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// Why receive failed
        reason: String,
    },

    /// Peer sent more than the accepted response size.
    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Configured limit
        limit: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `AcceptFailed` error from the OS error.
    #[must_use]
    pub fn accept_failed(source: &io::Error) -> Self {
        Self::AcceptFailed {
            kind: source.kind(),
            reason: source.to_string(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the listening socket itself is unusable.
    ///
    /// An accept error caused by one peer (reset or aborted handshake) is
    /// not fatal; the loop logs it and accepts again.
    #[must_use]
    pub fn is_fatal_to_listener(&self) -> bool {
        match self {
            Self::BindFailed { .. } | Self::AddressInUse { .. } | Self::InvalidAddress { .. } => {
                true
            }
            Self::AcceptFailed { kind, .. } => !matches!(
                kind,
                io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error concerns a single connection.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. }
                | Self::SendFailed { .. }
                | Self::ReceiveFailed { .. }
                | Self::ResponseTooLarge { .. }
        )
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: "unspecified I/O operation".into(),
            source: err,
        }
    }
}

// ============================================
// Tests
// ============================================
