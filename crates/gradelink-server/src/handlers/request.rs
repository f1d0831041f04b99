// ============================================
// File: crates/gradelink-server/src/handlers/request.rs
// ============================================
//! # Request Handler
//!
//! ## Creation Reason
//! Turns the bytes of one request into the bytes of one response token (or
//! a decision to close without replying).
//!
//! ## Request Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1. Decode request                                          │
//! │     ┌──────────────────────┬───────────────────────┐        │
//! │     │ Identifier (7 bytes) │ Command token         │        │
//! │     └──────────────────────┴───────────────────────┘        │
//! │     malformed ──► Reply::Malformed                          │
//! │                                                             │
//! │  2. Lookup identifier in the store                          │
//! │     absent ──► Reply::NotFound                              │
//! │                                                             │
//! │  3. Select payload from the command                         │
//! │     unknown token ──► Reply::InvalidCommand                 │
//! │     average ──► full scan, one column                       │
//! │     grades  ──► the matched record                          │
//! │                                                             │
//! │  4. Encode payload, seal under the matched record's key     │
//! │     ──► Reply::Token                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The lookup happens before the command is examined, so an unknown
//!   identifier with a bad command is reported as NotFound
//! - Never log the payload or the key; identifiers and commands are fine
//! - Malformed input and unknown commands log at `warn`, unknown
//!   identifiers at `info`; the client only ever sees a silent close
//!
//! ## Last Modified
//! v0.1.0 - Initial request handler

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use gradelink_common::time::Timestamp;
use gradelink_core::crypto::{DefaultTokenCipher, RecordKey, TokenCipher};
use gradelink_core::protocol::{decode_request, encode_response, Payload, Selection};

use crate::error::Result;
use crate::services::{averages, RecordStore};

// ============================================
// Reply
// ============================================

/// What the server should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this token, then close.
    Token(Vec<u8>),
    /// Close without replying: the input could not be decoded.
    Malformed {
        /// Decoder error text
        reason: String,
    },
    /// Close without replying: no record has the identifier.
    NotFound {
        /// Requested identifier
        student_id: String,
    },
    /// Close without replying: the command token is not recognized.
    InvalidCommand {
        /// Token exactly as received
        token: String,
    },
}

// ============================================
// RequestHandler
// ============================================

/// Decodes requests, looks up records, and seals responses.
///
/// # Thread Safety
/// Holds only shared, read-only state.
pub struct RequestHandler {
    /// Backing record store.
    store: Arc<RecordStore>,
    /// Response token cipher.
    cipher: DefaultTokenCipher,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            cipher: DefaultTokenCipher::new(),
        }
    }

    /// Returns the store this handler reads from.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Processes one raw request.
    ///
    /// Protocol-level outcomes (malformed, not found, invalid command) are
    /// returned as [`Reply`] variants.
    ///
    /// # Errors
    /// - Store errors while looking up or scanning
    /// - `InvalidKey` if the matched record's key field is unusable
    /// - `Encryption` if sealing fails
    pub fn handle(&self, raw: &[u8]) -> Result<Reply> {
        let request = match decode_request(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(bytes = raw.len(), "Malformed request: {}", e);
                return Ok(Reply::Malformed {
                    reason: e.to_string(),
                });
            }
        };

        let student_id = request.student_id.clone();
        trace!(%student_id, token = %request.token, "Request decoded");

        let Some(record) = self.store.lookup(&student_id)? else {
            info!(%student_id, "No record for identifier");
            return Ok(Reply::NotFound {
                student_id: student_id.to_string(),
            });
        };

        let command = request.command();
        let Some(selection) = command.selection() else {
            warn!(%student_id, token = %request.token, "Invalid command");
            return Ok(Reply::InvalidCommand {
                token: request.token,
            });
        };

        debug!(%student_id, %command, "Dispatching {}", command.describe());

        let key = RecordKey::derive(&record)?;
        let payload = match selection {
            Selection::Average(column) => Payload::Average(averages(&self.store)?.get(column)),
            Selection::FullRecord => Payload::Grades(record),
        };

        let plaintext = encode_response(&payload)?;
        let token = self.cipher.seal(&key, Timestamp::now(), &plaintext)?;

        debug!(%student_id, %command, bytes = token.len(), "Response sealed");
        Ok(Reply::Token(token))
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;

    use gradelink_core::crypto::decrypt;
    use gradelink_core::protocol::{decode_response, Command};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::ServerError;

    fn store_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "role,id,key,l1,l2,l3,l4,mid,e1,e2,e3,e4").unwrap();
        writeln!(file, "S,1000000,k1,80,70,90,60,75,88,92,77,65").unwrap();
        writeln!(file, "S,1000001,k2,90,80,70,60,85,90,30,20,10").unwrap();
        writeln!(file, "S,1000002,,90,80,70,60,80,89,30,20,10").unwrap();
        file.flush().unwrap();
        file
    }

    fn handler(file: &NamedTempFile) -> RequestHandler {
        RequestHandler::new(Arc::new(RecordStore::open(file.path())))
    }

    fn key_for(field: &str) -> RecordKey {
        RecordKey::from_field(field).unwrap()
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs one request with an `info`-level subscriber and returns the log.
    fn handle_logged(handler: &RequestHandler, raw: &[u8]) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || handler.handle(raw).unwrap());
        let bytes = buffer.0.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_average_reply() {
        let file = store_file();
        let Reply::Token(token) = handler(&file).handle(b"1000000GMA").unwrap() else {
            panic!("expected a token");
        };

        // Sealed under the requester's key, averaged across all rows.
        let plaintext = decrypt(&key_for("k1"), &token).unwrap();
        assert_eq!(plaintext, b"80");
        assert!(decrypt(&key_for("k2"), &token).is_err());
    }

    #[test]
    fn test_exam_average_uses_first_exam_column() {
        let file = store_file();
        let Reply::Token(token) = handler(&file).handle(b"1000001GEA").unwrap() else {
            panic!("expected a token");
        };
        assert_eq!(decrypt(&key_for("k2"), &token).unwrap(), b"89");
    }

    #[test]
    fn test_full_grades_reply() {
        let file = store_file();
        let Reply::Token(token) = handler(&file).handle(b"1000000GG").unwrap() else {
            panic!("expected a token");
        };

        let plaintext = decrypt(&key_for("k1"), &token).unwrap();
        let Payload::Grades(record) = decode_response(Command::FullGrades, &plaintext).unwrap()
        else {
            panic!("expected grades");
        };
        assert_eq!(record.identifier, "1000000");
        assert_eq!(record.scores, [80, 70, 90, 60, 75, 88, 92, 77, 65]);
    }

    #[test]
    fn test_not_found() {
        let file = store_file();
        assert_eq!(
            handler(&file).handle(b"9999999GG").unwrap(),
            Reply::NotFound {
                student_id: "9999999".into()
            }
        );
    }

    #[test]
    fn test_invalid_command() {
        let file = store_file();
        assert_eq!(
            handler(&file).handle(b"1000000ZZZZ").unwrap(),
            Reply::InvalidCommand {
                token: "ZZZZ".into()
            }
        );
        // Commands are case-sensitive.
        assert!(matches!(
            handler(&file).handle(b"1000000gma").unwrap(),
            Reply::InvalidCommand { .. }
        ));
    }

    #[test]
    fn test_unknown_identifier_wins_over_invalid_command() {
        let file = store_file();
        assert!(matches!(
            handler(&file).handle(b"9999999ZZZZ").unwrap(),
            Reply::NotFound { .. }
        ));
    }

    #[test]
    fn test_malformed() {
        let file = store_file();
        let handler = handler(&file);
        assert!(matches!(handler.handle(b"123").unwrap(), Reply::Malformed { .. }));
        assert!(matches!(
            handler.handle(b"10000\x0100GMA").unwrap(),
            Reply::Malformed { .. }
        ));
    }

    #[test]
    fn test_rejections_are_visible_at_info_level() {
        let file = store_file();
        let handler = handler(&file);

        let log = handle_logged(&handler, b"1000000ZZZZ");
        assert!(log.contains("WARN"), "{log}");
        assert!(log.contains("Invalid command"), "{log}");

        let log = handle_logged(&handler, b"123");
        assert!(log.contains("WARN"), "{log}");
        assert!(log.contains("Malformed request"), "{log}");

        let log = handle_logged(&handler, b"9999999GG");
        assert!(log.contains("INFO"), "{log}");
        assert!(log.contains("No record for identifier"), "{log}");

        // A served request stays below the info threshold.
        assert!(handle_logged(&handler, b"1000000GG").is_empty());
    }

    #[test]
    fn test_unusable_key_is_an_error() {
        let file = store_file();
        let err = handler(&file).handle(b"1000002GG").unwrap_err();
        assert!(matches!(err, ServerError::Core(_)), "{err}");
    }

    #[test]
    fn test_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RequestHandler::new(Arc::new(RecordStore::open(dir.path().join("x.csv"))));
        assert!(matches!(
            handler.handle(b"1000000GMA"),
            Err(ServerError::StoreOpen { .. })
        ));
    }
}
