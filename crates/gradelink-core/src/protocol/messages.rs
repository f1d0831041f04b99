// ============================================
// File: crates/gradelink-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines the request and response shapes exchanged between the grade
//! client and server.
//!
//! ## Main Functionality
//! - `Command`: closed set of request intents parsed from the token suffix
//! - `Selection`: what a command selects from the store
//! - `Request`: identifier + command token
//! - `Payload`: the plaintext carried inside a response token
//!
//! ## Command Tokens
//! | Token | Command | Selects |
//! |-------|---------|---------|
//! | `GMA` | MidtermAverage | average of column 4 |
//! | `GL1A` | Lab1Average | average of column 0 |
//! | `GL2A` | Lab2Average | average of column 1 |
//! | `GL3A` | Lab3Average | average of column 2 |
//! | `GL4A` | Lab4Average | average of column 3 |
//! | `GEA` | ExamAverage | average of column 5 (Exam 1 only) |
//! | `GG` | FullGrades | the caller's full record |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Token matching is exact and case-sensitive
//! - `GEA` averages the first exam column only; changing it changes the
//!   meaning of existing clients' requests
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::fmt;

use gradelink_common::types::{Record, ScoreColumn, StudentId};

use crate::error::{CoreError, Result};

// ============================================
// Command
// ============================================

/// Request intent, parsed once per request from the token suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `GMA`: average midterm score.
    MidtermAverage,
    /// `GL1A`: average Lab 1 score.
    Lab1Average,
    /// `GL2A`: average Lab 2 score.
    Lab2Average,
    /// `GL3A`: average Lab 3 score.
    Lab3Average,
    /// `GL4A`: average Lab 4 score.
    Lab4Average,
    /// `GEA`: average exam score (first exam column).
    ExamAverage,
    /// `GG`: the requester's full record.
    FullGrades,
    /// Any unrecognized token.
    Invalid,
}

/// What a command selects from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The average of one score column across all records.
    Average(ScoreColumn),
    /// The matched record itself.
    FullRecord,
}

impl Command {
    /// Every command that has a wire token.
    pub const VALID: [Self; 7] = [
        Self::MidtermAverage,
        Self::Lab1Average,
        Self::Lab2Average,
        Self::Lab3Average,
        Self::Lab4Average,
        Self::ExamAverage,
        Self::FullGrades,
    ];

    /// Parses a command token. Unknown tokens map to [`Command::Invalid`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "GMA" => Self::MidtermAverage,
            "GL1A" => Self::Lab1Average,
            "GL2A" => Self::Lab2Average,
            "GL3A" => Self::Lab3Average,
            "GL4A" => Self::Lab4Average,
            "GEA" => Self::ExamAverage,
            "GG" => Self::FullGrades,
            _ => Self::Invalid,
        }
    }

    /// Returns the wire token, or `None` for [`Command::Invalid`].
    #[must_use]
    pub const fn token(self) -> Option<&'static str> {
        match self {
            Self::MidtermAverage => Some("GMA"),
            Self::Lab1Average => Some("GL1A"),
            Self::Lab2Average => Some("GL2A"),
            Self::Lab3Average => Some("GL3A"),
            Self::Lab4Average => Some("GL4A"),
            Self::ExamAverage => Some("GEA"),
            Self::FullGrades => Some("GG"),
            Self::Invalid => None,
        }
    }

    /// Returns what this command selects, or `None` for [`Command::Invalid`].
    #[must_use]
    pub const fn selection(self) -> Option<Selection> {
        match self {
            Self::MidtermAverage => Some(Selection::Average(ScoreColumn::Midterm)),
            Self::Lab1Average => Some(Selection::Average(ScoreColumn::Lab1)),
            Self::Lab2Average => Some(Selection::Average(ScoreColumn::Lab2)),
            Self::Lab3Average => Some(Selection::Average(ScoreColumn::Lab3)),
            Self::Lab4Average => Some(Selection::Average(ScoreColumn::Lab4)),
            Self::ExamAverage => Some(Selection::Average(ScoreColumn::Exam1)),
            Self::FullGrades => Some(Selection::FullRecord),
            Self::Invalid => None,
        }
    }

    /// Returns `true` unless this is [`Command::Invalid`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Short description used in logs and console output.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::MidtermAverage => "Midterm average",
            Self::Lab1Average => "Lab 1 average",
            Self::Lab2Average => "Lab 2 average",
            Self::Lab3Average => "Lab 3 average",
            Self::Lab4Average => "Lab 4 average",
            Self::ExamAverage => "Exam average",
            Self::FullGrades => "Grades",
            Self::Invalid => "Invalid command",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token().unwrap_or("<invalid>"))
    }
}

// ============================================
// Request
// ============================================

/// A decoded request: identifier plus the raw command token.
///
/// The raw token is kept (rather than only the parsed [`Command`]) so that
/// an unrecognized token can still be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Fixed-width identifier prefix.
    pub student_id: StudentId,
    /// Command token suffix, exactly as received.
    pub token: String,
}

impl Request {
    /// Builds a request for a valid command.
    ///
    /// # Errors
    /// `UnencodableCommand` for [`Command::Invalid`].
    pub fn new(student_id: StudentId, command: Command) -> Result<Self> {
        let token = command.token().ok_or_else(|| CoreError::UnencodableCommand {
            command: format!("{command:?}"),
        })?;
        Ok(Self {
            student_id,
            token: token.to_string(),
        })
    }

    /// Parses the command token.
    #[must_use]
    pub fn command(&self) -> Command {
        Command::from_token(&self.token)
    }
}

// ============================================
// Payload
// ============================================

/// Plaintext carried inside a response token.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single column average.
    Average(f64),
    /// The requester's full record.
    Grades(Record),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Average(value) => write!(f, "{value}"),
            Self::Grades(record) => {
                write!(f, "{}", record.identifier)?;
                for column in ScoreColumn::ALL {
                    write!(f, "\n  {:<8} {}", column.label(), record.score(column))?;
                }
                Ok(())
            }
        }
    }
}

// ============================================
// Tests
// ============================================
