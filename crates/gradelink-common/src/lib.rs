// ============================================
// File: crates/gradelink-common/src/lib.rs
// ============================================
//! # Gradelink Common - Shared Types Library
//!
//! ## Creation Reason
//! Provides the foundational types shared by every Gradelink crate: the
//! fixed-width student identifier, the grade record row, and the error and
//! time helpers the protocol and server layers build on.
//!
//! ## Main Functionality
//! - [`types`]: `StudentId`, `Record`, `ScoreColumn`
//! - [`time`]: Unix timestamps used by the response token
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              gradelink-server                       │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   gradelink-core      gradelink-transport           │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │            gradelink-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//! - `Record` carries key material; its `Debug` output must stay redacted
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{Record, ScoreColumn, StudentId, SCORE_COUNT, STUDENT_ID_LEN};
