// ============================================
// File: crates/gradelink-server/src/lib.rs
// ============================================
//! # Gradelink Server Library
//!
//! ## Creation Reason
//! Provides the grade server and its client session, wiring the record
//! store, the codec and the token cipher onto the TCP transport.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: TOML configuration for server, store, client and logging
//! - [`server`]: Accept loop and per-connection session cycle
//! - [`client`]: One request per connection, decrypted with the local key
//! - [`services`]: Data-side services
//!   - [`services::store`]: CSV record lookup and scans
//!   - [`services::aggregate`]: Per-column averages
//! - [`handlers`]: Request processing
//! - [`error`]: Server-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Gradelink Server                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│   Server    │────►│ RequestHandler  │    │
//! │  │             │     │ accept loop │     │                 │    │
//! │  └─────────────┘     └─────────────┘     └────────┬────────┘    │
//! │                                                   │             │
//! │                          ┌────────────────────────┼──────┐      │
//! │                          ▼                        ▼      │      │
//! │                   ┌─────────────┐     ┌─────────────┐    │      │
//! │                   │ RecordStore │◄────│  aggregate  │    │      │
//! │                   └─────────────┘     └─────────────┘    │      │
//! │                                                          │      │
//! ├──────────────────────────────────────────────────────────┼──────┤
//! │              gradelink-core (codec, token cipher) ◄──────┘      │
//! │              gradelink-transport (TCP listener/connection)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The store file is re-read on every request unless `store.cache` is set
//! - Configuration changes require restart (no hot-reload)
//! - Graceful shutdown finishes the in-flight connection first
//!
//! ## Last Modified
//! v0.1.0 - Initial server library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod services;

// Re-export primary types
pub use client::{FetchOutcome, GradeClient};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::{Server, SessionOutcome};
