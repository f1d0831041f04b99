// ============================================
// File: crates/gradelink-server/src/services/mod.rs
// ============================================
//! # Server Services
//!
//! ## Creation Reason
//! Keeps the data-side logic (reading records, computing averages) apart
//! from the session and transport code.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`store`]: Record lookup and full scans over the backing CSV file
//! - [`aggregate`]: Per-column averages
//!
//! ## Service Interactions
//! ```text
//! RequestHandler ──lookup──► RecordStore ◄──scan_all── aggregate::averages
//! GradeClient    ──lookup──► RecordStore (local copy)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Services are synchronous; they run inside one connection cycle
//! - Both services are read-only
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod aggregate;
pub mod store;

// Re-export primary types
pub use aggregate::{averages, ColumnAverages, ColumnTotals};
pub use store::{RecordIter, RecordStore};
