// ============================================
// File: crates/gradelink-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines abstract interfaces for stream connections, so the server's
//! session cycle can run against TCP in production and an in-memory
//! connection in tests.
//!
//! ## Main Functionality
//! - `Connection`: one accepted or dialed byte stream
//! - `Listener`: source of inbound connections
//!
//! ## ⚠️ Important Note for Next Developer
//! - All I/O methods are async via `async_trait`
//! - `recv_once` is a single read: the server treats whatever one read
//!   returns as the whole request
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::Result;

// ============================================
// Connection Trait
// ============================================

/// Abstract interface for a single stream connection.
///
/// # Example
/// ```ignore
/// async fn echo<C: Connection>(conn: &mut C) -> Result<()> {
///     let mut buf = [0u8; 1024];
///     let len = conn.recv_once(&mut buf).await?;
///     conn.send_all(&buf[..len]).await?;
///     conn.close().await
/// }
/// ```
#[async_trait]
pub trait Connection: Send {
    /// Performs one read into `buf`.
    ///
    /// # Returns
    /// Number of bytes read; `0` means the peer closed its side.
    ///
    /// # Errors
    /// `ReceiveFailed` if the read fails.
    async fn recv_once(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Reads until the peer closes, accepting at most `limit` bytes.
    ///
    /// # Errors
    /// - `ReceiveFailed` if a read fails
    /// - `ResponseTooLarge` if more than `limit` bytes arrive
    async fn recv_to_end(&mut self, limit: usize) -> Result<Vec<u8>>;

    /// Writes the whole buffer.
    ///
    /// # Errors
    /// `SendFailed` if the write fails.
    async fn send_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Returns the remote address.
    fn peer_addr(&self) -> SocketAddr;

    /// Closes the write side and releases the connection.
    ///
    /// # Errors
    /// Returns an `Io` error if the shutdown fails.
    async fn close(&mut self) -> Result<()>;
}

// ============================================
// Listener Trait
// ============================================

/// Abstract interface for accepting connections.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Connection type produced by [`Listener::accept`].
    type Conn: Connection;

    /// Waits for the next inbound connection.
    ///
    /// # Errors
    /// `AcceptFailed`; check [`is_fatal_to_listener`] before giving up.
    ///
    /// [`is_fatal_to_listener`]: crate::error::TransportError::is_fatal_to_listener
    async fn accept(&self) -> Result<Self::Conn>;

    /// Returns the local address this listener is bound to.
    ///
    /// # Errors
    /// Returns error if address cannot be determined.
    fn local_addr(&self) -> Result<SocketAddr>;
}
