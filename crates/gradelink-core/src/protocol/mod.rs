// ============================================
// File: crates/gradelink-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the Gradelink wire protocol: one request per connection, one
//! encrypted response, then close.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: `Command`, `Request`, `Payload`
//! - [`codec`]: request framing and payload encoding
//!
//! ## Protocol Overview
//! ```text
//! ┌────────┐  "1000000GMA"                ┌────────┐
//! │ Client │ ───────────────────────────► │ Server │
//! │        │ ◄─────────────────────────── │        │
//! └────────┘  token(key, "75")  + close   └────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The server never answers a request it cannot serve (unknown
//!   identifier, unknown command): it just closes the connection
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;

// Re-export primary types
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, parse_command, Codec,
    RequestCodec,
};
pub use messages::{Command, Payload, Request, Selection};
