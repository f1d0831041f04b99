// ============================================
// File: crates/gradelink-transport/src/mock.rs
// ============================================
//! # Mock Connection Implementation
//!
//! ## Creation Reason
//! Provides an in-memory connection for testing the session cycle without
//! opening sockets.
//!
//! ## Main Functionality
//! - Scripted inbound reads (one chunk per `recv_once`)
//! - Capture of everything sent
//! - Close tracking
//! - Optional send failure
//!
//! ## Usage in Tests
//! ```
//! use gradelink_transport::{Connection, MockConnection};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut conn = MockConnection::new(b"1000000GMA".to_vec());
//! let mut buf = [0u8; 64];
//! let len = conn.recv_once(&mut buf).await.unwrap();
//! assert_eq!(&buf[..len], b"1000000GMA");
//!
//! conn.send_all(b"reply").await.unwrap();
//! conn.close().await.unwrap();
//! assert_eq!(conn.sent(), b"reply");
//! assert!(conn.is_closed());
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only; do not use in production
//! - Once the scripted chunks run out, reads return 0 (peer closed)
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Result, TransportError};
use crate::traits::Connection;

// ============================================
// MockConnection
// ============================================

/// In-memory connection for tests.
pub struct MockConnection {
    /// Chunks returned by successive reads
    inbound: Mutex<VecDeque<Vec<u8>>>,
    /// Everything written so far
    sent: Mutex<Vec<u8>>,
    /// Number of `send_all` calls
    send_calls: Mutex<usize>,
    /// Whether `close` was called
    closed: AtomicBool,
    /// Whether `send_all` should fail
    fail_sends: bool,
    /// Reported peer address
    peer: SocketAddr,
}

impl MockConnection {
    /// Creates a connection whose first read returns `inbound`.
    ///
    /// An empty `inbound` behaves like a peer that closed immediately.
    #[must_use]
    pub fn new(inbound: Vec<u8>) -> Self {
        let chunks = if inbound.is_empty() {
            Vec::new()
        } else {
            vec![inbound]
        };
        Self::with_chunks(chunks)
    }

    /// Creates a connection that returns each chunk from one read.
    #[must_use]
    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            inbound: Mutex::new(chunks.into()),
            sent: Mutex::new(Vec::new()),
            send_calls: Mutex::new(0),
            closed: AtomicBool::new(false),
            fail_sends: false,
            peer: SocketAddr::from((Ipv4Addr::LOCALHOST, 40_000)),
        }
    }

    /// Makes every `send_all` fail with `SendFailed`.
    #[must_use]
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Returns a copy of everything sent.
    #[must_use]
    pub fn sent(&self) -> Vec<u8> {
        self.sent.lock().clone()
    }

    /// Returns the number of `send_all` calls.
    #[must_use]
    pub fn send_calls(&self) -> usize {
        *self.send_calls.lock()
    }

    /// Returns `true` once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn recv_once(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inbound = self.inbound.lock();
        let Some(mut chunk) = inbound.pop_front() else {
            return Ok(0);
        };

        let len = chunk.len().min(buf.len());
        buf[..len].copy_from_slice(&chunk[..len]);

        // Leave the unread tail for the next read, like a stream would.
        if len < chunk.len() {
            inbound.push_front(chunk.split_off(len));
        }
        Ok(len)
    }

    async fn recv_to_end(&mut self, limit: usize) -> Result<Vec<u8>> {
        let mut received = Vec::new();
        for chunk in self.inbound.lock().drain(..) {
            if received.len() + chunk.len() > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }
            received.extend_from_slice(&chunk);
        }
        Ok(received)
    }

    async fn send_all(&mut self, buf: &[u8]) -> Result<()> {
        *self.send_calls.lock() += 1;
        if self.fail_sends {
            return Err(TransportError::SendFailed {
                dest: self.peer,
                reason: "mock send failure".into(),
            });
        }
        self.sent.lock().extend_from_slice(buf);
        Ok(())
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection")
            .field("peer", &self.peer)
            .field("pending_reads", &self.inbound.lock().len())
            .field("sent_bytes", &self.sent.lock().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
