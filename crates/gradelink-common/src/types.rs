// ============================================
// File: crates/gradelink-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the row and identifier types that every layer of Gradelink
//! agrees on, so the store, the codec and the client all parse a grade row
//! the same way.
//!
//! ## Main Functionality
//! - `StudentId`: Fixed-width (7 byte) printable ASCII identifier
//! - `ScoreColumn`: The nine score columns in their fixed order
//! - `Record`: One parsed row of the backing store
//!
//! ## Row Layout
//! ```text
//! ┌──────┬────────────┬─────┬──────┬──────┬──────┬──────┬─────────┬───────┬───────┬───────┬───────┐
//! │ role │ identifier │ key │ Lab1 │ Lab2 │ Lab3 │ Lab4 │ Midterm │ Exam1 │ Exam2 │ Exam3 │ Exam4 │
//! └──────┴────────────┴─────┴──────┴──────┴──────┴──────┴─────────┴───────┴───────┴───────┴───────┘
//!    0         1         2      3      4      5      6       7        8       9      10      11
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Column order is part of the wire contract (full-record responses)
//! - `Record`'s `Debug` impl redacts the key column; keep it that way
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use crate::error::{CommonError, Result};

// ============================================
// Constants
// ============================================

/// Width of a student identifier in bytes.
pub const STUDENT_ID_LEN: usize = 7;

/// Number of score columns in a record.
pub const SCORE_COUNT: usize = 9;

/// Total number of columns in a store row.
pub const RECORD_FIELD_COUNT: usize = 3 + SCORE_COUNT;

/// Index of the identifier column in a store row.
pub const IDENTIFIER_COLUMN: usize = 1;

/// Index of the key column in a store row.
pub const KEY_COLUMN: usize = 2;

/// Index of the first score column in a store row.
pub const FIRST_SCORE_COLUMN: usize = 3;

// ============================================
// StudentId
// ============================================

/// Fixed-width student identifier.
///
/// Exactly [`STUDENT_ID_LEN`] printable ASCII characters. The identifier
/// occupies the first bytes of every request, so its width is what lets the
/// server split a request without a delimiter.
///
/// # Example
/// ```
/// use gradelink_common::types::StudentId;
///
/// let id: StudentId = "1000000".parse().unwrap();
/// assert_eq!(id.as_str(), "1000000");
/// assert!("123".parse::<StudentId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentId(String);

impl StudentId {
    /// Creates a `StudentId`, validating width and character set.
    ///
    /// # Errors
    /// - `InvalidLength` if the text is not exactly 7 bytes
    /// - `InvalidInput` if any byte is not printable ASCII
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() != STUDENT_ID_LEN {
            return Err(CommonError::invalid_length(STUDENT_ID_LEN, value.len()));
        }
        if !is_printable_ascii(value.as_bytes()) {
            return Err(CommonError::invalid_input(
                "student_id",
                "must be printable ASCII",
            ));
        }
        Ok(Self(value))
    }

    /// Creates a `StudentId` from exactly 7 raw bytes.
    ///
    /// # Errors
    /// Same as [`StudentId::new`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STUDENT_ID_LEN {
            return Err(CommonError::invalid_length(STUDENT_ID_LEN, bytes.len()));
        }
        if !is_printable_ascii(bytes) {
            return Err(CommonError::invalid_input(
                "student_id",
                "must be printable ASCII",
            ));
        }
        // Printable ASCII is valid UTF-8.
        Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StudentId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if every byte is printable ASCII (space through `~`).
#[must_use]
pub fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (0x20..=0x7e).contains(b))
}

// ============================================
// ScoreColumn
// ============================================

/// The nine score columns of a record, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreColumn {
    /// Lab 1 score.
    Lab1,
    /// Lab 2 score.
    Lab2,
    /// Lab 3 score.
    Lab3,
    /// Lab 4 score.
    Lab4,
    /// Midterm score.
    Midterm,
    /// Exam 1 score.
    Exam1,
    /// Exam 2 score.
    Exam2,
    /// Exam 3 score.
    Exam3,
    /// Exam 4 score.
    Exam4,
}

impl ScoreColumn {
    /// All columns in storage order.
    pub const ALL: [Self; SCORE_COUNT] = [
        Self::Lab1,
        Self::Lab2,
        Self::Lab3,
        Self::Lab4,
        Self::Midterm,
        Self::Exam1,
        Self::Exam2,
        Self::Exam3,
        Self::Exam4,
    ];

    /// Position of this column within the score block (0..9).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable column label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lab1 => "Lab 1",
            Self::Lab2 => "Lab 2",
            Self::Lab3 => "Lab 3",
            Self::Lab4 => "Lab 4",
            Self::Midterm => "Midterm",
            Self::Exam1 => "Exam 1",
            Self::Exam2 => "Exam 2",
            Self::Exam3 => "Exam 3",
            Self::Exam4 => "Exam 4",
        }
    }
}

impl fmt::Display for ScoreColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================
// Record
// ============================================

/// One row of the backing store.
///
/// The identifier is kept as the raw column text: lookups compare it to the
/// requested [`StudentId`] by exact string equality, so rows whose identifier
/// is not 7 characters wide are still valid records (they simply never match).
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    /// Column 0: role marker, not interpreted.
    pub role: String,
    /// Column 1: identifier text.
    pub identifier: String,
    /// Column 2: symmetric key text.
    pub key: String,
    /// Columns 3..12: scores in [`ScoreColumn`] order.
    pub scores: [i64; SCORE_COUNT],
}

impl Record {
    /// Parses a record from the 12 fields of a store row.
    ///
    /// # Errors
    /// - `InvalidLength` if the row does not have exactly 12 fields
    /// - `InvalidInput` if a score does not parse as an integer
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<S> = fields.into_iter().collect();
        if fields.len() != RECORD_FIELD_COUNT {
            return Err(CommonError::invalid_length(RECORD_FIELD_COUNT, fields.len()));
        }

        let mut scores = [0i64; SCORE_COUNT];
        for (column, raw) in ScoreColumn::ALL.iter().zip(&fields[FIRST_SCORE_COLUMN..]) {
            let raw = raw.as_ref().trim();
            scores[column.index()] = raw.parse().map_err(|_| {
                CommonError::invalid_input(
                    column.label(),
                    format!("score '{raw}' is not an integer"),
                )
            })?;
        }

        Ok(Self {
            role: fields[0].as_ref().to_string(),
            identifier: fields[IDENTIFIER_COLUMN].as_ref().to_string(),
            key: fields[KEY_COLUMN].as_ref().to_string(),
            scores,
        })
    }

    /// Returns the score in the given column.
    #[must_use]
    pub const fn score(&self, column: ScoreColumn) -> i64 {
        self.scores[column.index()]
    }

    /// Returns the 12 fields of this record in storage order.
    #[must_use]
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(RECORD_FIELD_COUNT);
        fields.push(self.role.clone());
        fields.push(self.identifier.clone());
        fields.push(self.key.clone());
        fields.extend(self.scores.iter().map(ToString::to_string));
        fields
    }

    /// Returns `true` if this record's identifier equals `id` exactly.
    #[must_use]
    pub fn matches(&self, id: &StudentId) -> bool {
        self.identifier == id.as_str()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("role", &self.role)
            .field("identifier", &self.identifier)
            .field("key", &"<redacted>")
            .field("scores", &self.scores)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Vec<&'static str> {
        vec![
            "S", "1000000", "k1", "80", "70", "90", "60", "75", "88", "92", "77", "65",
        ]
    }

    #[test]
    fn test_student_id_width() {
        assert!(StudentId::new("1000000").is_ok());
        assert!(matches!(
            StudentId::new("100000"),
            Err(CommonError::InvalidLength { expected: 7, actual: 6 })
        ));
        assert!(StudentId::new("10000000").is_err());
    }

    #[test]
    fn test_student_id_rejects_control_bytes() {
        assert!(StudentId::from_bytes(b"100\n000").is_err());
        assert!(StudentId::from_bytes(&[0xff; 7]).is_err());
        assert_eq!(StudentId::from_bytes(b"A-12 34").unwrap().as_str(), "A-12 34");
    }

    #[test]
    fn test_record_from_fields() {
        let record = Record::from_fields(sample_fields()).unwrap();
        assert_eq!(record.identifier, "1000000");
        assert_eq!(record.key, "k1");
        assert_eq!(record.score(ScoreColumn::Midterm), 75);
        assert_eq!(record.score(ScoreColumn::Exam4), 65);
        assert_eq!(record.to_fields(), sample_fields());
    }

    #[test]
    fn test_record_rejects_bad_scores() {
        let mut fields = sample_fields();
        fields[7] = "seventy-five";
        let err = Record::from_fields(fields).unwrap_err();
        assert!(err.to_string().contains("Midterm"));

        let short = &sample_fields()[..5];
        assert!(matches!(
            Record::from_fields(short),
            Err(CommonError::InvalidLength { expected: 12, actual: 5 })
        ));
    }

    #[test]
    fn test_record_debug_redacts_key() {
        let record = Record::from_fields(sample_fields()).unwrap();
        let debug = format!("{record:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("k1"));
    }

    #[test]
    fn test_score_column_order() {
        assert_eq!(ScoreColumn::Lab1.index(), 0);
        assert_eq!(ScoreColumn::Midterm.index(), 4);
        assert_eq!(ScoreColumn::Exam1.index(), 5);
        assert_eq!(ScoreColumn::ALL.len(), SCORE_COUNT);
    }
}
