// ============================================
// File: crates/gradelink-server/src/services/store.rs
// ============================================
//! # Record Store
//!
//! ## Creation Reason
//! Reads grade records from the backing CSV file for the server (to answer
//! requests) and for the client (to find its own key).
//!
//! ## Main Functionality
//! - `RecordStore::lookup`: first row whose identifier matches exactly
//! - `RecordStore::scan_all`: lazy iterator over every row
//! - `RecordStore::record_count`: row count for startup diagnostics
//! - Optional in-memory cache of raw rows, invalidated by file metadata
//!
//! ## File Layout
//! ```text
//! role,identifier,key,lab1,lab2,lab3,lab4,midterm,exam1,exam2,exam3,exam4   <- header, skipped
//! S,1000000,k1,80,70,90,60,75,88,92,77,65
//! S,1000001,k2,90,...
//! ```
//!
//! ## Read Model
//! Every call re-opens the file unless the cache is enabled. With the cache,
//! rows are kept as raw CSV records and still parsed per call, so a
//! malformed row only fails the operations that actually touch it.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Identifier matching is exact: no trimming, no case folding
//! - `lookup` parses only the matching row; other rows may be malformed
//!   without affecting it
//! - The store is read-only; there is no write path
//!
//! ## Last Modified
//! v0.1.0 - Initial record store

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use parking_lot::Mutex;
use tracing::{debug, trace};

use gradelink_common::types::{Record, StudentId, IDENTIFIER_COLUMN};

use crate::config::StoreConfig;
use crate::error::{Result, ServerError};

// ============================================
// RecordStore
// ============================================

/// Read-only view of the backing CSV file.
///
/// # Thread Safety
/// `Send + Sync`; the cache is guarded by a mutex held only while the
/// cached rows are checked or replaced.
pub struct RecordStore {
    /// Backing file path
    path: PathBuf,
    /// Cached rows, present only when caching is enabled
    cache: Option<Mutex<Option<CachedRows>>>,
}

/// One raw row and the line it came from.
#[derive(Debug, Clone)]
struct RawRow {
    line: u64,
    fields: StringRecord,
}

/// Snapshot of the file as of `stamp`.
struct CachedRows {
    stamp: FileStamp,
    rows: Arc<Vec<RawRow>>,
}

/// File metadata used to detect changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl RecordStore {
    /// Creates a store that re-reads the file on every call.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Creates a store that keeps rows in memory until the file changes.
    pub fn cached(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Some(Mutex::new(None)),
        }
    }

    /// Creates a store as described by the `[store]` config section.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        if config.cache {
            Self::cached(&config.backing_file_path)
        } else {
            Self::open(&config.backing_file_path)
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if rows are cached between calls.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Finds the first record whose identifier equals `id` exactly.
    ///
    /// `Ok(None)` means no row matched.
    ///
    /// # Errors
    /// - `StoreOpen` / `StoreRead` if the file cannot be read
    /// - `MalformedRecord` if the matching row cannot be parsed
    pub fn lookup(&self, id: &StudentId) -> Result<Option<Record>> {
        let found = match self.cached_rows()? {
            Some(rows) => rows
                .iter()
                .find(|row| identifier_matches(&row.fields, id))
                .cloned(),
            None => {
                let mut found = None;
                for row in self.read_rows()? {
                    let row = row?;
                    if identifier_matches(&row.fields, id) {
                        found = Some(row);
                        break;
                    }
                }
                found
            }
        };

        match found {
            Some(row) => {
                trace!(student_id = %id, line = row.line, "Record found");
                parse_row(&row).map(Some)
            }
            None => {
                trace!(student_id = %id, "Record not found");
                Ok(None)
            }
        }
    }

    /// Returns a lazy iterator over every record.
    ///
    /// Each call reads the file independently (or snapshots the cache).
    ///
    /// # Errors
    /// `StoreOpen` if the file cannot be opened.
    pub fn scan_all(&self) -> Result<RecordIter> {
        let source = match self.cached_rows()? {
            Some(rows) => RowSource::Cached { rows, next: 0 },
            None => RowSource::File {
                rows: self.read_rows()?,
            },
        };
        Ok(RecordIter { source })
    }

    /// Counts the records in the store.
    ///
    /// # Errors
    /// Fails on the first unreadable or malformed row.
    pub fn record_count(&self) -> Result<usize> {
        self.scan_all()?
            .try_fold(0usize, |count, record| record.map(|_| count + 1))
    }

    // ========================================
    // Internals
    // ========================================

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn read_rows(&self) -> Result<FileRows> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| ServerError::store_open(self.display_path(), e.to_string()))?;

        Ok(FileRows {
            path: self.display_path(),
            inner: reader.into_records(),
        })
    }

    fn stamp(&self) -> Result<FileStamp> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| ServerError::store_open(self.display_path(), e.to_string()))?;
        Ok(FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }

    /// Returns the cached rows, refreshing them if the file changed.
    /// `None` when caching is disabled.
    fn cached_rows(&self) -> Result<Option<Arc<Vec<RawRow>>>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        let stamp = self.stamp()?;
        let mut guard = cache.lock();

        if let Some(cached) = guard.as_ref() {
            if cached.stamp == stamp {
                return Ok(Some(Arc::clone(&cached.rows)));
            }
        }

        let rows: Vec<RawRow> = self.read_rows()?.collect::<Result<_>>()?;
        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            "Record store cache refreshed"
        );

        let rows = Arc::new(rows);
        *guard = Some(CachedRows {
            stamp,
            rows: Arc::clone(&rows),
        });
        Ok(Some(rows))
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("cached", &self.is_cached())
            .finish()
    }
}

// ============================================
// Row Parsing
// ============================================

/// Raw rows straight from the file.
struct FileRows {
    path: String,
    inner: StringRecordsIntoIter<File>,
}

impl Iterator for FileRows {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let fields = match self.inner.next()? {
            Ok(fields) => fields,
            Err(e) => return Some(Err(ServerError::store_read(&self.path, e.to_string()))),
        };
        let line = fields.position().map_or(0, csv::Position::line);
        Some(Ok(RawRow { line, fields }))
    }
}

fn identifier_matches(fields: &StringRecord, id: &StudentId) -> bool {
    fields.get(IDENTIFIER_COLUMN) == Some(id.as_str())
}

fn parse_row(row: &RawRow) -> Result<Record> {
    Record::from_fields(row.fields.iter())
        .map_err(|e| ServerError::malformed_record(row.line, e.to_string()))
}

// ============================================
// RecordIter
// ============================================

/// Lazy iterator over the records of one scan.
pub struct RecordIter {
    source: RowSource,
}

enum RowSource {
    File { rows: FileRows },
    Cached { rows: Arc<Vec<RawRow>>, next: usize },
}

impl Iterator for RecordIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            RowSource::File { rows } => rows.next().map(|row| row.and_then(|r| parse_row(&r))),
            RowSource::Cached { rows, next } => {
                let row = rows.get(*next)?;
                *next += 1;
                Some(parse_row(row))
            }
        }
    }
}

impl std::fmt::Debug for RecordIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.source {
            RowSource::File { .. } => "file",
            RowSource::Cached { .. } => "cached",
        };
        f.debug_struct("RecordIter").field("source", &kind).finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const HEADER: &str = "role,id,key,l1,l2,l3,l4,mid,e1,e2,e3,e4\n";

    fn store_file(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn id(text: &str) -> StudentId {
        StudentId::new(text).unwrap()
    }

    #[test]
    fn test_lookup_present_and_absent() {
        let file = store_file(&[
            "S,1000000,k1,80,70,90,60,75,88,92,77,65",
            "S,1000001,k2,90,80,70,60,50,40,30,20,10",
        ]);
        let store = RecordStore::open(file.path());

        let record = store.lookup(&id("1000001")).unwrap().unwrap();
        assert_eq!(record.identifier, "1000001");
        assert_eq!(record.key, "k2");
        assert_eq!(record.scores[0], 90);

        assert!(store.lookup(&id("9999999")).unwrap().is_none());
    }

    #[test]
    fn test_header_row_is_skipped() {
        // A header whose identifier column happens to look like an ID.
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "x,1234567,key,a,b,c,d,e,f,g,h,i").unwrap();
        writeln!(file, "S,1000000,k1,80,70,90,60,75,88,92,77,65").unwrap();
        file.flush().unwrap();

        let store = RecordStore::open(file.path());
        assert!(store.lookup(&id("1234567")).unwrap().is_none());
        assert_eq!(store.record_count().unwrap(), 1);
    }

    #[test]
    fn test_lookup_is_exact() {
        let file = store_file(&["S, 100000,k1,80,70,90,60,75,88,92,77,65"]);
        let store = RecordStore::open(file.path());
        assert!(store.lookup(&id("100000 ")).unwrap().is_none());
        assert!(store.lookup(&id(" 100000")).unwrap().is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let file = store_file(&[
            "S,1000000,first,80,70,90,60,75,88,92,77,65",
            "S,1000000,second,80,70,90,60,75,88,92,77,65",
        ]);
        let store = RecordStore::open(file.path());
        assert_eq!(store.lookup(&id("1000000")).unwrap().unwrap().key, "first");
    }

    #[test]
    fn test_malformed_rows() {
        let file = store_file(&[
            "S,1000000,k1,80,70,90,60,75,88,92,77,65",
            "S,1000001,k2,90,80",
            "S,1000002,k3,x,80,70,60,50,40,30,20,10",
        ]);
        let store = RecordStore::open(file.path());

        // Unrelated malformed rows do not affect a lookup.
        assert!(store.lookup(&id("1000000")).unwrap().is_some());

        // The matching row itself is malformed.
        let err = store.lookup(&id("1000001")).unwrap_err();
        assert!(matches!(err, ServerError::MalformedRecord { line: 3, .. }), "{err}");

        let err = store.lookup(&id("1000002")).unwrap_err();
        assert!(matches!(err, ServerError::MalformedRecord { line: 4, .. }), "{err}");

        // A full scan surfaces the first bad row.
        assert!(store.record_count().is_err());
    }

    #[test]
    fn test_quoted_fields() {
        let file = store_file(&["\"TA, lab\",1000000,k1,80,70,90,60,75,88,92,77,65"]);
        let store = RecordStore::open(file.path());
        let record = store.lookup(&id("1000000")).unwrap().unwrap();
        assert_eq!(record.role, "TA, lab");
    }

    #[test]
    fn test_scan_all_is_lazy_and_repeatable() {
        let file = store_file(&[
            "S,1000000,k1,80,70,90,60,75,88,92,77,65",
            "S,1000001,k2,90,80,70,60,50,40,30,20,10",
            "S,1000002,k3,100,80,70,60,50,40,30,20,10",
        ]);
        let store = RecordStore::open(file.path());

        let first: Vec<Record> = store.scan_all().unwrap().map(Result::unwrap).collect();
        let second: Vec<Record> = store.scan_all().unwrap().map(Result::unwrap).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);

        let mut iter = store.scan_all().unwrap();
        assert_eq!(iter.next().unwrap().unwrap().identifier, "1000000");
    }

    #[test]
    fn test_fresh_read_sees_changes() {
        let mut file = store_file(&["S,1000000,k1,80,70,90,60,75,88,92,77,65"]);
        let store = RecordStore::open(file.path());
        assert!(store.lookup(&id("1000001")).unwrap().is_none());

        writeln!(file, "S,1000001,k2,90,80,70,60,50,40,30,20,10").unwrap();
        file.flush().unwrap();
        assert!(store.lookup(&id("1000001")).unwrap().is_some());
    }

    #[test]
    fn test_cache_invalidates_on_change() {
        let mut file = store_file(&["S,1000000,k1,80,70,90,60,75,88,92,77,65"]);
        let store = RecordStore::cached(file.path());
        assert!(store.is_cached());

        assert_eq!(store.record_count().unwrap(), 1);
        assert!(store.lookup(&id("1000001")).unwrap().is_none());

        // Appending changes the file length, which invalidates the cache.
        writeln!(file, "S,1000001,k2,90,80,70,60,50,40,30,20,10").unwrap();
        file.flush().unwrap();

        assert_eq!(store.record_count().unwrap(), 2);
        assert_eq!(store.lookup(&id("1000001")).unwrap().unwrap().key, "k2");
    }

    #[test]
    fn test_cache_keeps_lookup_semantics() {
        let file = store_file(&[
            "S,1000000,k1,80,70,90,60,75,88,92,77,65",
            "S,1000001,k2,oops,80,70,60,50,40,30,20,10",
        ]);
        let store = RecordStore::cached(file.path());
        assert!(store.lookup(&id("1000000")).unwrap().is_some());
        assert!(matches!(
            store.lookup(&id("1000001")),
            Err(ServerError::MalformedRecord { line: 3, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("absent.csv"));
        assert!(matches!(
            store.lookup(&id("1000000")),
            Err(ServerError::StoreOpen { .. })
        ));
        assert!(store.scan_all().is_err());

        let cached = RecordStore::cached(dir.path().join("absent.csv"));
        assert!(matches!(
            cached.record_count(),
            Err(ServerError::StoreOpen { .. })
        ));
    }

    #[test]
    fn test_header_only_store_is_empty() {
        let file = store_file(&[]);
        let store = RecordStore::open(file.path());
        assert_eq!(store.record_count().unwrap(), 0);
        assert!(store.lookup(&id("1000000")).unwrap().is_none());
    }
}
