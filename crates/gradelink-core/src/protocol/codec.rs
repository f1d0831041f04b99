// ============================================
// File: crates/gradelink-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Provides framing for requests and the plaintext encoding of response
//! payloads before they are sealed into a token.
//!
//! ## Wire Format
//! ```text
//! request  = identifier (7 bytes, printable ASCII) || token (ASCII, 0+ bytes)
//! response = token bytes produced by the crypto layer
//! payload  = "<f64 Display>"            (averages)
//!          | "<12 fields as one CSV line>" (full record)
//! ```
//! A request has no length prefix and no terminator: one transport write is
//! one message, and the split point is the fixed identifier width.
//!
//! ## Parsing Strategy
//! 1. Check minimum message length (identifier width)
//! 2. Split at the fixed offset
//! 3. Validate both halves as printable ASCII
//! 4. Leave the token unparsed; [`Command::from_token`] decides validity
//!
//! ## ⚠️ Important Note for Next Developer
//! - Averages use Rust's shortest round-trip `f64` formatting, so `75.0`
//!   travels as `"75"` and `83.5` as `"83.5"`
//! - An unknown token is NOT a decode error: it decodes to a request whose
//!   command is `Invalid`, and the session layer decides what to do
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use gradelink_common::types::{is_printable_ascii, Record, StudentId, STUDENT_ID_LEN};

use crate::error::{CoreError, Result};
use crate::protocol::messages::{Command, Payload, Request, Selection};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol messages.
pub trait Codec<T> {
    /// Encodes a message into a byte buffer.
    ///
    /// # Errors
    /// Returns an error if the message cannot be represented on the wire.
    fn encode(&self, msg: &T, buf: &mut BytesMut) -> Result<()>;

    /// Decodes a message, consuming the whole buffer.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a valid message.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// RequestCodec
// ============================================

/// Codec for client requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestCodec;

impl RequestCodec {
    /// Creates a new request codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec<Request> for RequestCodec {
    fn encode(&self, msg: &Request, buf: &mut BytesMut) -> Result<()> {
        if !is_printable_ascii(msg.token.as_bytes()) {
            return Err(CoreError::malformed("command token must be printable ASCII"));
        }
        buf.reserve(STUDENT_ID_LEN + msg.token.len());
        buf.put_slice(msg.student_id.as_bytes());
        buf.put_slice(msg.token.as_bytes());
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Request> {
        if buf.len() < STUDENT_ID_LEN {
            return Err(CoreError::too_short(STUDENT_ID_LEN, buf.len()));
        }

        let id_bytes = buf.split_to(STUDENT_ID_LEN);
        let student_id = StudentId::from_bytes(&id_bytes)
            .map_err(|_| CoreError::malformed("identifier is not printable ASCII"))?;

        let token_bytes = buf.copy_to_bytes(buf.remaining());
        if !is_printable_ascii(&token_bytes) {
            return Err(CoreError::malformed("command token is not printable ASCII"));
        }
        let token = String::from_utf8_lossy(&token_bytes).into_owned();

        Ok(Request { student_id, token })
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Decodes a raw request into identifier and command token.
///
/// # Errors
/// - `MessageTooShort` if fewer than 7 bytes were received
/// - `MalformedMessage` if either part is not printable ASCII
pub fn decode_request(buf: &[u8]) -> Result<Request> {
    let mut bytes = Bytes::copy_from_slice(buf);
    RequestCodec.decode(&mut bytes)
}

/// Encodes a request for a valid command.
///
/// # Errors
/// `UnencodableCommand` for [`Command::Invalid`].
pub fn encode_request(student_id: &StudentId, command: Command) -> Result<BytesMut> {
    let request = Request::new(student_id.clone(), command)?;
    let mut buf = BytesMut::with_capacity(STUDENT_ID_LEN + request.token.len());
    RequestCodec.encode(&request, &mut buf)?;
    Ok(buf)
}

/// Parses a command token; unknown text yields [`Command::Invalid`].
#[must_use]
pub fn parse_command(token: &str) -> Command {
    Command::from_token(token)
}

/// Renders a payload to the plaintext bytes that get encrypted.
///
/// # Errors
/// Returns an error if a record field cannot be written as CSV.
pub fn encode_response(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Average(value) => Ok(value.to_string().into_bytes()),
        Payload::Grades(record) => encode_record(record),
    }
}

/// Parses decrypted plaintext back into the payload `command` asked for.
///
/// # Errors
/// - `UnencodableCommand` for [`Command::Invalid`]
/// - `MalformedMessage` if the text does not match the expected shape
pub fn decode_response(command: Command, plaintext: &[u8]) -> Result<Payload> {
    let selection = command.selection().ok_or_else(|| CoreError::UnencodableCommand {
        command: format!("{command:?}"),
    })?;

    let text = std::str::from_utf8(plaintext)
        .map_err(|_| CoreError::malformed("response is not UTF-8"))?;

    match selection {
        Selection::Average(_) => text
            .trim()
            .parse::<f64>()
            .map(Payload::Average)
            .map_err(|_| CoreError::malformed(format!("'{text}' is not a number"))),
        Selection::FullRecord => decode_record(text).map(Payload::Grades),
    }
}

fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(record.to_fields())
        .map_err(|e| CoreError::malformed(format!("record encoding failed: {e}")))?;

    let mut line = writer
        .into_inner()
        .map_err(|e| CoreError::malformed(format!("record encoding failed: {}", e.error())))?;

    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(line)
}

fn decode_record(text: &str) -> Result<Record> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let row = reader
        .records()
        .next()
        .ok_or_else(|| CoreError::malformed("empty record response"))?
        .map_err(|e| CoreError::malformed(format!("record response: {e}")))?;

    Ok(Record::from_fields(row.iter())?)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        Record::from_fields([
            "S", "1000000", "k1", "80", "70", "90", "60", "75", "88", "92", "77", "65",
        ])
        .unwrap()
    }

    #[test]
    fn test_decode_splits_at_fixed_offset() {
        let request = decode_request(b"1000000GMA").unwrap();
        assert_eq!(request.student_id.as_str(), "1000000");
        assert_eq!(request.token, "GMA");
        assert_eq!(request.command(), Command::MidtermAverage);
    }

    #[test]
    fn test_decode_unknown_token_is_not_an_error() {
        let request = decode_request(b"1000000ZZZZ").unwrap();
        assert_eq!(request.token, "ZZZZ");
        assert_eq!(request.command(), Command::Invalid);

        let bare = decode_request(b"1000000").unwrap();
        assert_eq!(bare.token, "");
        assert_eq!(bare.command(), Command::Invalid);
    }

    #[test]
    fn test_decode_too_short() {
        let result = decode_request(b"10000");
        assert!(matches!(
            result,
            Err(CoreError::MessageTooShort { expected: 7, actual: 5 })
        ));
        assert!(decode_request(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_non_ascii() {
        assert!(matches!(
            decode_request(b"10\xff0000GMA"),
            Err(CoreError::MalformedMessage { .. })
        ));
        assert!(matches!(
            decode_request(b"1000000G\xc3\xa9"),
            Err(CoreError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_request_roundtrip_every_command() {
        for id in ["1000000", "0000042", "ABCDEFG"] {
            let student_id = StudentId::new(id).unwrap();
            for command in Command::VALID {
                let encoded = encode_request(&student_id, command).unwrap();
                let decoded = decode_request(&encoded).unwrap();
                assert_eq!(decoded.student_id, student_id);
                assert_eq!(decoded.command(), command);
            }
        }
    }

    #[test]
    fn test_encode_request_wire_bytes() {
        let id = StudentId::new("1000000").unwrap();
        let encoded = encode_request(&id, Command::Lab3Average).unwrap();
        assert_eq!(&encoded[..], b"1000000GL3A");
        assert!(encode_request(&id, Command::Invalid).is_err());
    }

    #[test]
    fn test_average_formatting() {
        assert_eq!(encode_response(&Payload::Average(75.0)).unwrap(), b"75");
        assert_eq!(encode_response(&Payload::Average(83.5)).unwrap(), b"83.5");
        assert_eq!(
            decode_response(Command::MidtermAverage, b"75").unwrap(),
            Payload::Average(75.0)
        );
    }

    #[test]
    fn test_record_response_roundtrip() {
        let record = sample_record();
        let encoded = encode_response(&Payload::Grades(record.clone())).unwrap();
        assert_eq!(encoded, b"S,1000000,k1,80,70,90,60,75,88,92,77,65");

        let decoded = decode_response(Command::FullGrades, &encoded).unwrap();
        assert_eq!(decoded, Payload::Grades(record));
    }

    #[test]
    fn test_record_with_comma_is_quoted() {
        let mut record = sample_record();
        record.role = "TA, lab".to_string();
        let encoded = encode_response(&Payload::Grades(record.clone())).unwrap();
        assert!(encoded.starts_with(b"\"TA, lab\","));
        assert_eq!(
            decode_response(Command::FullGrades, &encoded).unwrap(),
            Payload::Grades(record)
        );
    }

    #[test]
    fn test_decode_response_shape_errors() {
        assert!(decode_response(Command::Lab1Average, b"not-a-number").is_err());
        assert!(decode_response(Command::FullGrades, b"too,few,fields").is_err());
        assert!(matches!(
            decode_response(Command::Invalid, b"75"),
            Err(CoreError::UnencodableCommand { .. })
        ));
    }
}
