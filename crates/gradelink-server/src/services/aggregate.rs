// ============================================
// File: crates/gradelink-server/src/services/aggregate.rs
// ============================================
//! # Aggregate Calculator
//!
//! ## Creation Reason
//! Computes the per-column averages served by the average commands and
//! printed by `gradelink averages`.
//!
//! ## Main Functionality
//! - `ColumnTotals`: running `i64` sums (overflow checked) and a record count
//! - `ColumnAverages`: the nine `sum / N` values in storage order
//! - `averages`: one full scan of a `RecordStore`
//!
//! ## ⚠️ Important Note for Next Developer
//! - An empty store is an error (`EmptyStore`), never NaN or zero
//! - The exam average command only uses the first exam column
//!
//! ## Last Modified
//! v0.1.0 - Initial aggregate calculator

use gradelink_common::types::{Record, ScoreColumn, SCORE_COUNT};

use crate::error::{Result, ServerError};
use crate::services::store::RecordStore;

/// Per-column averages, indexed in [`ScoreColumn`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnAverages([f64; SCORE_COUNT]);

impl ColumnAverages {
    /// Returns the average of one column.
    #[must_use]
    pub const fn get(&self, column: ScoreColumn) -> f64 {
        self.0[column.index()]
    }

    /// Returns all nine averages.
    #[must_use]
    pub const fn as_array(&self) -> &[f64; SCORE_COUNT] {
        &self.0
    }

    /// Iterates `(column, average)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (ScoreColumn, f64)> + '_ {
        ScoreColumn::ALL.into_iter().map(|column| (column, self.get(column)))
    }
}

/// Running column sums.
#[derive(Debug, Clone, Default)]
pub struct ColumnTotals {
    sums: [i64; SCORE_COUNT],
    count: u64,
}

impl ColumnTotals {
    /// Creates empty totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record's scores.
    ///
    /// The totals are unchanged if any column would overflow.
    ///
    /// # Errors
    /// `AggregateOverflow` naming the first column whose sum leaves `i64`.
    pub fn add(&mut self, record: &Record) -> Result<()> {
        let mut sums = self.sums;
        for (column, (sum, score)) in ScoreColumn::ALL
            .iter()
            .zip(sums.iter_mut().zip(record.scores))
        {
            *sum = sum
                .checked_add(score)
                .ok_or_else(|| ServerError::AggregateOverflow {
                    column: column.label().to_string(),
                })?;
        }
        self.sums = sums;
        self.count += 1;
        Ok(())
    }

    /// Consumes records until the first error.
    ///
    /// # Errors
    /// Returns the first error yielded by `records`.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        records.into_iter().try_fold(Self::new(), |mut totals, record| {
            totals.add(&record?)?;
            Ok(totals)
        })
    }

    /// Number of records added.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Returns the averages, or `None` if no record was added.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn averages(&self) -> Option<ColumnAverages> {
        if self.count == 0 {
            return None;
        }
        let count = self.count as f64;
        Some(ColumnAverages(self.sums.map(|sum| sum as f64 / count)))
    }
}

/// Averages every score column over the whole store.
///
/// # Errors
/// - `EmptyStore` if the store has no records
/// - any store error raised while scanning
pub fn averages(store: &RecordStore) -> Result<ColumnAverages> {
    ColumnTotals::from_records(store.scan_all()?)?
        .averages()
        .ok_or_else(|| ServerError::EmptyStore {
            path: store.path().display().to_string(),
        })
}
