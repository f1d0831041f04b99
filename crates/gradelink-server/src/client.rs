// ============================================
// File: crates/gradelink-server/src/client.rs
// ============================================
//! # Grade Client
//!
//! ## Creation Reason
//! Client side of the protocol: sends one request per connection and
//! decrypts the reply with the key from a local copy of the store.
//!
//! ## Main Functionality
//! - `GradeClient::fetch`: one typed request/response cycle
//! - `GradeClient::fetch_token`: same, with a raw command token
//! - `FetchOutcome`: reply or silent close
//!
//! ## Client Flow
//! ```text
//! connect ──► send id+token ──► read until close
//!                                   │
//!                 empty ◄───────────┤
//!          (NoResponse)             ▼
//!                         local lookup(id) ──► derive key ──► decrypt ──► Payload
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The client needs its own copy of the store: the key that opens the
//!   reply never crosses the wire
//! - A silent close means "not found" or "invalid command"; the protocol
//!   does not say which
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

use tracing::{debug, info};

use gradelink_common::types::StudentId;
use gradelink_core::crypto::{decrypt, decrypt_with_ttl, RecordKey};
use gradelink_core::protocol::{decode_response, Command, Payload};
use gradelink_core::CoreError;
use gradelink_transport::{Connection, TcpConnection};

use crate::config::{ClientConfig, ServerConfig};
use crate::error::{Result, ServerError};
use crate::services::RecordStore;

/// Result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The server replied and the reply decrypted.
    Reply(Payload),
    /// The server closed without replying.
    NoResponse,
}

/// Client for one Gradelink server.
#[derive(Debug)]
pub struct GradeClient {
    config: ClientConfig,
    store: RecordStore,
}

impl GradeClient {
    /// Creates a client from the `[client]` and `[store]` sections.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_store(config.client.clone(), RecordStore::from_config(&config.store))
    }

    /// Creates a client with an explicit local store.
    #[must_use]
    pub const fn with_store(config: ClientConfig, store: RecordStore) -> Self {
        Self { config, store }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests `command` for `student_id`.
    ///
    /// # Errors
    /// - `UnencodableCommand` for [`Command::Invalid`]
    /// - Transport errors while connecting or exchanging
    /// - `UnknownLocalRecord` if the local store has no key for the id
    /// - `Decryption` / `TokenExpired` if the reply does not open
    pub async fn fetch(&self, student_id: &StudentId, command: Command) -> Result<FetchOutcome> {
        let token = command.token().ok_or_else(|| CoreError::UnencodableCommand {
            command: format!("{command:?}"),
        })?;
        self.fetch_token(student_id, token).await
    }

    /// Requests a raw command token, which may be unknown to the server.
    ///
    /// # Errors
    /// Same as [`GradeClient::fetch`].
    pub async fn fetch_token(&self, student_id: &StudentId, token: &str) -> Result<FetchOutcome> {
        let mut conn =
            TcpConnection::connect(&self.config.server_host, self.config.server_port).await?;
        let result = self.exchange(&mut conn, student_id, token).await;

        if let Err(e) = conn.close().await {
            debug!("Close error: {}", e);
        }
        result
    }

    /// Runs one exchange over an already open connection.
    ///
    /// # Errors
    /// Same as [`GradeClient::fetch`].
    pub async fn exchange<C: Connection>(
        &self,
        conn: &mut C,
        student_id: &StudentId,
        token: &str,
    ) -> Result<FetchOutcome> {
        let mut request = Vec::with_capacity(student_id.as_bytes().len() + token.len());
        request.extend_from_slice(student_id.as_bytes());
        request.extend_from_slice(token.as_bytes());

        conn.send_all(&request).await?;
        debug!(%student_id, token, peer = %conn.peer_addr(), "Request sent");

        let reply = conn.recv_to_end(self.config.recv_buffer_size).await?;
        if reply.is_empty() {
            info!(%student_id, token, "Server closed without a response");
            return Ok(FetchOutcome::NoResponse);
        }
        debug!(bytes = reply.len(), "Response received");

        let record = self
            .store
            .lookup(student_id)?
            .ok_or_else(|| ServerError::UnknownLocalRecord {
                student_id: student_id.to_string(),
            })?;
        let key = RecordKey::derive(&record)?;

        let plaintext = match self.config.token_ttl_secs {
            Some(ttl) => decrypt_with_ttl(&key, &reply, ttl)?,
            None => decrypt(&key, &reply)?,
        };

        Ok(FetchOutcome::Reply(decode_response(
            Command::from_token(token),
            &plaintext,
        )?))
    }
}

// ============================================
// Tests
// ============================================
