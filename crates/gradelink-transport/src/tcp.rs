// ============================================
// File: crates/gradelink-transport/src/tcp.rs
// ============================================
//! # TCP Transport Implementation
//!
//! ## Creation Reason
//! Provides the TCP listener used by the server and the outbound connection
//! used by the client, wrapping Tokio's TCP types with our traits.
//!
//! ## Main Functionality
//! - `TcpTransport`: listening socket (implements `Listener`)
//! - `TcpConnection`: one stream (implements `Connection`)
//!
//! ## Design Choices
//! - The listening socket is built with socket2 so that SO_REUSEADDR and the
//!   listen backlog can be set before Tokio takes it over
//! - Closing a connection shuts down the write half so the peer sees EOF,
//!   which is the response framing
//!
//! ## ⚠️ Important Note for Next Developer
//! - Consider firewall rules when binding to public addresses
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP transport implementation

use std::net::SocketAddr;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{Connection, Listener};

/// Chunk size used while draining a response.
const READ_CHUNK_SIZE: usize = 1024;

// ============================================
// TcpTransport
// ============================================

/// TCP listening socket.
///
/// # Example
/// ```ignore
/// use gradelink_transport::{Listener, TcpTransport};
///
/// let transport = TcpTransport::bind("0.0.0.0:50000", 10).await?;
/// let mut conn = transport.accept().await?;
/// ```
pub struct TcpTransport {
    /// Underlying listener
    listener: TcpListener,
    /// Local address we're bound to
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Creates a listener bound to `addr` (e.g. `"0.0.0.0:50000"`).
    ///
    /// # Errors
    /// - `InvalidAddress`: if `addr` is not a socket address
    /// - `AddressInUse` / `BindFailed`: if binding fails
    pub async fn bind(addr: impl AsRef<str>, backlog: u32) -> Result<Self> {
        let addr_str = addr.as_ref();
        let socket_addr: SocketAddr =
            addr_str
                .parse()
                .map_err(|_| TransportError::InvalidAddress {
                    addr: addr_str.to_string(),
                })?;

        Self::bind_addr(socket_addr, backlog).await
    }

    /// Creates a listener bound to the specified socket address.
    ///
    /// # Socket Options
    /// - `SO_REUSEADDR`: Enabled for quick rebinding
    /// - Non-blocking: Required for async operations
    ///
    /// # Errors
    /// Returns error if any socket setup step fails.
    pub async fn bind_addr(addr: SocketAddr, backlog: u32) -> Result<Self> {
        info!("Binding TCP listener to {}", addr);

        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| TransportError::io("creating TCP socket", e))?;

        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;

        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::io("setting non-blocking", e))?;

        socket.bind(&addr.into()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                TransportError::AddressInUse { addr }
            } else {
                TransportError::bind_failed(addr, e.to_string())
            }
        })?;

        let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
        socket
            .listen(backlog)
            .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

        // Convert to Tokio listener
        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)
            .map_err(|e| TransportError::io("converting to Tokio listener", e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("getting local address", e))?;

        info!("TCP listener bound to {} (backlog {})", local_addr, backlog);

        Ok(Self {
            listener,
            local_addr,
        })
    }
}

#[async_trait]
impl Listener for TcpTransport {
    type Conn = TcpConnection;

    async fn accept(&self) -> Result<TcpConnection> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::accept_failed(&e))?;

        debug!("Accepted connection from {}", peer);

        Ok(TcpConnection { stream, peer })
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

// ============================================
// TcpConnection
// ============================================

/// A single TCP stream.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Dials `host:port`. The host may be a name (`localhost`) or an address.
    ///
    /// # Errors
    /// `ConnectFailed` if resolution or the TCP handshake fails.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let target = format!("{host}:{port}");

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::connect_failed(&target, e.to_string()))?;

        let peer = stream
            .peer_addr()
            .map_err(|e| TransportError::connect_failed(&target, e.to_string()))?;

        debug!("Connected to {} ({})", target, peer);

        Ok(Self { stream, peer })
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn recv_once(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self
            .stream
            .read(buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed {
                reason: e.to_string(),
            })?;

        trace!("Received {} bytes from {}", len, self.peer);
        Ok(len)
    }

    async fn recv_to_end(&mut self, limit: usize) -> Result<Vec<u8>> {
        let mut received = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let len = self.recv_once(&mut chunk).await?;
            if len == 0 {
                break;
            }
            if received.len() + len > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }
            received.extend_from_slice(&chunk[..len]);
        }

        Ok(received)
    }

    async fn send_all(&mut self, buf: &[u8]) -> Result<()> {
        self.stream
            .write_all(buf)
            .await
            .map_err(|e| TransportError::SendFailed {
                dest: self.peer,
                reason: e.to_string(),
            })?;

        trace!("Sent {} bytes to {}", buf.len(), self.peer);
        Ok(())
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            // The peer already went away; nothing left to close.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::io("shutting down stream", e)),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_and_local_addr() {
        let transport = TcpTransport::bind("127.0.0.1:0", 10).await.unwrap();
        let addr = transport.local_addr().unwrap();

        assert_eq!(addr.ip(), std::net::Ipv4Addr::LOCALHOST);
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let result = TcpTransport::bind("not-an-address", 10).await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_address_in_use() {
        let first = TcpTransport::bind("127.0.0.1:0", 10).await.unwrap();
        let addr = first.local_addr().unwrap();

        let second = TcpTransport::bind_addr(addr, 10).await;
        let err = second.unwrap_err();
        assert!(err.is_fatal_to_listener());
    }

    #[tokio::test]
    async fn test_request_response_loopback() {
        let server = TcpTransport::bind("127.0.0.1:0", 10).await.unwrap();
        let port = server.local_addr().unwrap().port();

        let server_task = tokio::spawn(async move {
            let mut conn = server.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let len = conn.recv_once(&mut buf).await.unwrap();
            conn.send_all(&buf[..len]).await.unwrap();
            conn.send_all(b"!").await.unwrap();
            conn.close().await.unwrap();
        });

        let mut client = TcpConnection::connect("127.0.0.1", port).await.unwrap();
        assert_eq!(client.peer_addr().port(), port);
        client.send_all(b"1000000GMA").await.unwrap();
        let reply = client.recv_to_end(1024).await.unwrap();
        assert_eq!(reply, b"1000000GMA!");

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_recv_to_end_enforces_limit() {
        let server = TcpTransport::bind("127.0.0.1:0", 10).await.unwrap();
        let port = server.local_addr().unwrap().port();

        let server_task = tokio::spawn(async move {
            let mut conn = server.accept().await.unwrap();
            conn.send_all(&[b'x'; 300]).await.unwrap();
            conn.close().await.unwrap();
        });

        let mut client = TcpConnection::connect("127.0.0.1", port).await.unwrap();
        let result = client.recv_to_end(100).await;
        assert!(matches!(
            result,
            Err(TransportError::ResponseTooLarge { limit: 100 })
        ));

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_without_reply_reads_empty() {
        let server = TcpTransport::bind("127.0.0.1:0", 10).await.unwrap();
        let port = server.local_addr().unwrap().port();

        let server_task = tokio::spawn(async move {
            let mut conn = server.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = conn.recv_once(&mut buf).await.unwrap();
            conn.close().await.unwrap();
        });

        let mut client = TcpConnection::connect("127.0.0.1", port).await.unwrap();
        client.send_all(b"9999999GG").await.unwrap();
        let reply = client.recv_to_end(1024).await.unwrap();
        assert!(reply.is_empty());

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let t = TcpTransport::bind("127.0.0.1:0", 1).await.unwrap();
            t.local_addr().unwrap().port()
        };
        let result = TcpConnection::connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
    }
}
