// ============================================
// File: crates/gradelink-transport/src/lib.rs
// ============================================
//! # Gradelink Transport - Network I/O Layer
//!
//! ## Creation Reason
//! Provides the stream transport for Gradelink: a TCP listener for the
//! server, outbound connections for the client, and an in-memory connection
//! for exercising the session logic without sockets.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `Connection` and `Listener` abstractions
//! - [`tcp`]: TCP implementation (socket2 listener, tokio streams)
//! - [`mock`]: In-memory `Connection` for tests
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              gradelink-server                       │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   gradelink-core       gradelink-transport          │
//! │                        You are here ◄──             │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             gradelink-common                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One connection carries exactly one request and one response; message
//!   boundaries are "one write" (request) and "until close" (response)
//! - Always go through the traits so the server stays testable
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mock;
pub mod tcp;
pub mod traits;

// Re-export primary types
pub use error::{Result, TransportError};
pub use mock::MockConnection;
pub use tcp::{TcpConnection, TcpTransport};
pub use traits::{Connection, Listener};
