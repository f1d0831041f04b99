// ============================================
// File: crates/gradelink-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use gradelink_common::error::CommonError;
use gradelink_core::error::CoreError;
use gradelink_transport::error::TransportError;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Failed to open record store '{path}': {reason}")]
    StoreOpen {
        path: String,
        reason: String,
    },

    #[error("Failed to read record store '{path}': {reason}")]
    StoreRead {
        path: String,
        reason: String,
    },

    /// A store row that cannot be parsed. `line` is 1-based.
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord {
        line: u64,
        reason: String,
    },

    #[error("Sum of column {column} exceeds the integer range")]
    AggregateOverflow {
        column: String,
    },

    #[error("Record store '{path}' has no records")]
    EmptyStore {
        path: String,
    },

    /// The client's own store copy has no row for the identifier it asked
    /// about, so it has no key to decrypt with.
    #[error("No local record for '{student_id}'")]
    UnknownLocalRecord {
        student_id: String,
    },

    #[error("Server failed to start: {reason}")]
    StartupFailed {
        reason: String,
    },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn store_open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn store_read(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_record(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::EmptyStore { .. }
        )
    }

    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreOpen { .. }
                | Self::StoreRead { .. }
                | Self::MalformedRecord { .. }
                | Self::AggregateOverflow { .. }
                | Self::EmptyStore { .. }
        )
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::StartupFailed { .. } => {
                true
            }
            Self::Transport(e) => e.is_fatal_to_listener(),
            _ => false,
        }
    }
}
