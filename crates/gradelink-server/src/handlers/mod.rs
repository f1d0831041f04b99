// ============================================
// File: crates/gradelink-server/src/handlers/mod.rs
// ============================================
//! # Request Handlers
//!
//! ## Creation Reason
//! Provides the per-request logic of the server, independent of sockets so
//! it can be exercised directly from tests.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`request`]: Request decoding, record lookup, dispatch and sealing
//!
//! ## Data Flow
//! ```text
//! raw bytes ──► decode ──► lookup ──► select ──► encode ──► seal ──► Reply
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers never touch the connection; the server decides what to send
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod request;

pub use request::{Reply, RequestHandler};
