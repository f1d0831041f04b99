// ============================================
// File: crates/gradelink-server/src/server.rs
// ============================================
//! # Server Orchestrator
//!
//! ## Creation Reason
//! Owns the listening socket and runs the accept loop, driving one
//! request/response cycle per connection.
//!
//! ## Main Functionality
//! - `Server`: lifecycle (startup report, bind, serve, shutdown)
//! - `Server::serve_connection`: one full session on any `Connection`
//! - `SessionOutcome`: how a session ended
//!
//! ## Session Cycle
//! ```text
//!  Listening ──accept──► Accepted ──recv──► Decoding ──► LookingUp
//!      ▲                    │ 0 bytes           │ malformed  │ not found
//!      │                    ▼                   ▼            ▼
//!      │                 Closed ◄───────────────┴────────────┘
//!      │                    ▲
//!      │                    │ invalid command
//!      │               Dispatching ──► Encrypting ──► Sending ──► Closed
//!      └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Connections are handled strictly one at a time: the next `accept`
//!   only starts after the current connection is closed
//! - Shutdown interrupts a pending `accept`, never an in-flight session
//! - Only listener failures end the loop; session failures are logged
//! - No read timeout is applied, so a silent peer blocks the loop
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use gradelink_transport::{Connection, Listener, TcpTransport};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::{Reply, RequestHandler};
use crate::services::RecordStore;

// ============================================
// SessionOutcome
// ============================================

/// How one connection cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A token was sent.
    Responded {
        /// Token length
        bytes: usize,
    },
    /// The peer closed before sending anything.
    PeerClosed,
    /// The request could not be decoded.
    Malformed,
    /// No record matched the identifier.
    NotFound,
    /// The command token was not recognized.
    InvalidCommand,
    /// The cycle failed (store, cipher, or socket error).
    Failed {
        /// Error text
        reason: String,
    },
}

impl SessionOutcome {
    /// Returns `true` if a response was sent.
    #[must_use]
    pub const fn responded(&self) -> bool {
        matches!(self, Self::Responded { .. })
    }
}

// ============================================
// Server
// ============================================

/// Gradelink grade server.
///
/// # Lifecycle
/// 1. Create with `Server::new(config)`
/// 2. Start with `server.run().await`
/// 3. Stop via Ctrl+C or `server.shutdown()`
pub struct Server {
    /// Server configuration.
    config: ServerConfig,
    /// Per-request logic.
    handler: RequestHandler,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// The store is opened lazily; nothing touches the file until the
    /// first request or the startup report.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(RecordStore::from_config(&config.store));
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            handler: RequestHandler::new(store),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the backing record store.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        self.handler.store()
    }

    /// Runs the server until shutdown.
    ///
    /// # Errors
    /// Returns error if the listener cannot be set up or fails while
    /// accepting.
    pub async fn run(&self) -> Result<()> {
        info!("Starting Gradelink server v{}", env!("CARGO_PKG_VERSION"));

        self.report_store();

        let listener = self.bind().await?;
        let signal_task = self.spawn_signal_task();

        info!("Server started successfully");
        let result = self.serve(&listener).await;

        signal_task.abort();
        info!("Server shutdown complete");
        result
    }

    /// Binds the TCP listener described by `[network]`.
    ///
    /// # Errors
    /// `StartupFailed` if the address is invalid or binding fails.
    pub async fn bind(&self) -> Result<TcpTransport> {
        let network = &self.config.network;
        let addr = network.socket_addr()?;

        TcpTransport::bind_addr(addr, network.backlog)
            .await
            .map_err(|e| ServerError::startup_failed(format!("TCP bind on {addr} failed: {e}")))
    }

    /// Accepts and serves connections one at a time until shutdown.
    ///
    /// # Errors
    /// Returns the listener error if accepting fails in a way the socket
    /// cannot recover from.
    pub async fn serve<L: Listener>(&self, listener: &L) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        if let Ok(addr) = listener.local_addr() {
            info!("Listening on {}", addr);
        }

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok(mut conn) => {
                            self.serve_connection(&mut conn).await;
                        }
                        Err(e) if e.is_fatal_to_listener() => {
                            error!("Listener failed: {}", e);
                            return Err(e.into());
                        }
                        Err(e) => {
                            warn!("Accept error: {}", e);
                        }
                    }
                }
            }
        }

        debug!("Accept loop exiting");
        Ok(())
    }

    /// Runs one request/response cycle and closes the connection.
    #[instrument(skip(self, conn), fields(peer = %conn.peer_addr()))]
    pub async fn serve_connection<C: Connection>(&self, conn: &mut C) -> SessionOutcome {
        debug!("Connection accepted");

        let outcome = self.exchange(conn).await;

        if let Err(e) = conn.close().await {
            debug!("Close error: {}", e);
        }

        match &outcome {
            SessionOutcome::Responded { bytes } => info!(bytes, "Response sent"),
            SessionOutcome::Failed { reason } => warn!("Session failed: {}", reason),
            other => debug!(outcome = ?other, "Closed without response"),
        }

        outcome
    }

    /// Triggers server shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    // ========================================
    // Internals
    // ========================================

    async fn exchange<C: Connection>(&self, conn: &mut C) -> SessionOutcome {
        let mut buf = vec![0u8; self.config.network.recv_buffer_size];

        let len = match conn.recv_once(&mut buf).await {
            Ok(0) => return SessionOutcome::PeerClosed,
            Ok(len) => len,
            Err(e) => {
                return SessionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        debug!(bytes = len, "Request received");

        let reply = match self.handler.handle(&buf[..len]) {
            Ok(reply) => reply,
            Err(e) => {
                return SessionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        match reply {
            Reply::Token(token) => match conn.send_all(&token).await {
                Ok(()) => SessionOutcome::Responded { bytes: token.len() },
                Err(e) => SessionOutcome::Failed {
                    reason: e.to_string(),
                },
            },
            Reply::Malformed { .. } => SessionOutcome::Malformed,
            Reply::NotFound { .. } => SessionOutcome::NotFound,
            Reply::InvalidCommand { .. } => SessionOutcome::InvalidCommand,
        }
    }

    /// Logs the store path and size. Problems are reported, not fatal:
    /// the file is re-read on every request and may be fixed later.
    fn report_store(&self) {
        let store = self.store();
        match store.record_count() {
            Ok(0) => warn!(
                path = %store.path().display(),
                "Record store is empty; every request will be answered with a close"
            ),
            Ok(count) => info!(
                path = %store.path().display(),
                records = count,
                cached = store.is_cached(),
                "Record store loaded"
            ),
            Err(e) => warn!(path = %store.path().display(), "Record store unreadable: {}", e),
        }
    }

    /// Spawns the task that turns Ctrl+C into a shutdown.
    fn spawn_signal_task(&self) -> JoinHandle<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown.store(true, Ordering::SeqCst);
                    let _ = shutdown_tx.send(());
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        })
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_address", &self.config.network.listen_address)
            .field("listen_port", &self.config.network.listen_port)
            .field("store", &self.store())
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use gradelink_core::crypto::{decrypt, RecordKey};
    use gradelink_transport::{MockConnection, TcpConnection};
    use tempfile::NamedTempFile;

    use super::*;

    fn store_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "role,id,key,l1,l2,l3,l4,mid,e1,e2,e3,e4").unwrap();
        writeln!(file, "S,1000000,k1,80,70,90,60,75,88,92,77,65").unwrap();
        file.flush().unwrap();
        file
    }

    fn server(file: &NamedTempFile) -> Server {
        let mut config = ServerConfig::default();
        config.network.listen_address = "127.0.0.1".into();
        config.network.listen_port = 0;
        config.store.backing_file_path = file.path().to_path_buf();
        Server::new(config)
    }

    #[tokio::test]
    async fn test_midterm_average_is_sealed_under_record_key() {
        let file = store_file();
        let server = server(&file);
        let mut conn = MockConnection::new(b"1000000GMA".to_vec());

        let outcome = server.serve_connection(&mut conn).await;
        assert!(outcome.responded(), "{outcome:?}");
        assert!(conn.is_closed());

        let key = RecordKey::from_field("k1").unwrap();
        assert_eq!(decrypt(&key, &conn.sent()).unwrap(), b"75");
    }

    #[tokio::test]
    async fn test_unknown_identifier_closes_silently() {
        let file = store_file();
        let server = server(&file);
        let mut conn = MockConnection::new(b"9999999GG".to_vec());

        assert_eq!(
            server.serve_connection(&mut conn).await,
            SessionOutcome::NotFound
        );
        assert_eq!(conn.send_calls(), 0);
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_invalid_command_closes_silently() {
        let file = store_file();
        let server = server(&file);
        let mut conn = MockConnection::new(b"1000000ZZZZ".to_vec());

        assert_eq!(
            server.serve_connection(&mut conn).await,
            SessionOutcome::InvalidCommand
        );
        assert_eq!(conn.send_calls(), 0);
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_peer_close_and_malformed() {
        let file = store_file();
        let server = server(&file);

        let mut conn = MockConnection::new(Vec::new());
        assert_eq!(
            server.serve_connection(&mut conn).await,
            SessionOutcome::PeerClosed
        );
        assert!(conn.is_closed());

        let mut conn = MockConnection::new(b"12".to_vec());
        assert_eq!(
            server.serve_connection(&mut conn).await,
            SessionOutcome::Malformed
        );
        assert_eq!(conn.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let file = store_file();
        let server = server(&file);
        let mut conn = MockConnection::new(b"1000000GG".to_vec()).failing_sends();

        let outcome = server.serve_connection(&mut conn).await;
        assert!(matches!(outcome, SessionOutcome::Failed { .. }));
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_overflowing_average_fails_the_session_only() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "role,id,key,l1,l2,l3,l4,mid,e1,e2,e3,e4").unwrap();
        writeln!(file, "S,1000000,k1,9223372036854775807,70,90,60,75,88,92,77,65").unwrap();
        writeln!(file, "S,1000001,k2,1,80,70,60,85,40,30,20,10").unwrap();
        file.flush().unwrap();
        let server = server(&file);

        let mut conn = MockConnection::new(b"1000000GL1A".to_vec());
        let outcome = server.serve_connection(&mut conn).await;
        assert!(matches!(outcome, SessionOutcome::Failed { .. }), "{outcome:?}");
        assert_eq!(conn.send_calls(), 0);
        assert!(conn.is_closed());

        // Requests that do not aggregate still succeed.
        let mut conn = MockConnection::new(b"1000001GG".to_vec());
        assert!(server.serve_connection(&mut conn).await.responded());
    }

    #[tokio::test]
    async fn test_serve_over_tcp_until_shutdown() {
        let file = store_file();
        let server = Arc::new(server(&file));
        let listener = server.bind().await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.serve(&listener).await })
        };

        // Two sequential sessions on the same listener.
        for request in [&b"1000000GL1A"[..], &b"1000000GG"[..]] {
            let mut conn = TcpConnection::connect("127.0.0.1", port).await.unwrap();
            conn.send_all(request).await.unwrap();
            let reply = conn.recv_to_end(1024).await.unwrap();
            assert!(!reply.is_empty());
        }

        let mut conn = TcpConnection::connect("127.0.0.1", port).await.unwrap();
        conn.send_all(b"9999999GG").await.unwrap();
        assert!(conn.recv_to_end(1024).await.unwrap().is_empty());

        server.shutdown();
        assert!(server.is_shutting_down());
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let file = store_file();
        let mut config = ServerConfig::default();
        config.network.listen_address = "not-an-ip".into();
        config.store.backing_file_path = file.path().to_path_buf();

        let err = Server::new(config).bind().await.unwrap_err();
        assert!(err.is_fatal(), "{err}");
    }
}
