// ============================================
// File: crates/gradelink-common/src/time.rs
// ============================================
//! # Time Utilities
//!
//! Unix timestamps embedded in response tokens as their issue time. The
//! token layer uses them to reject stale replies when a TTL is configured.
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::time::{SystemTime, UNIX_EPOCH};

// ============================================
// Timestamp
// ============================================

/// Unix timestamp in whole seconds.
///
/// # Example
/// ```
/// use gradelink_common::time::Timestamp;
///
/// let now = Timestamp::now();
/// assert!(now.is_within(5));
/// assert_eq!(Timestamp::from_be_bytes(now.to_be_bytes()), now);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from Unix seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Creates a timestamp for the current time.
    ///
    /// A clock set before the Unix epoch reads as zero.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }

    /// Returns the Unix timestamp in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp as big-endian bytes (token byte order).
    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Creates a timestamp from big-endian bytes.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Returns `true` if `|self - now| <= max_skew_secs`.
    #[must_use]
    pub fn is_within(&self, max_skew_secs: u64) -> bool {
        self.0.abs_diff(Self::now().0) <= max_skew_secs
    }

    /// Seconds elapsed since this timestamp, or `None` if it lies in
    /// the future.
    #[must_use]
    pub fn age_secs(&self) -> Option<u64> {
        Self::now().0.checked_sub(self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now() {
        let ts = Timestamp::now();
        assert!(ts.as_secs() > 1_577_836_800);
        assert!(ts.is_within(1));
        assert_eq!(ts.age_secs().map(|age| age <= 1), Some(true));
    }

    #[test]
    fn test_future_timestamp_has_no_age() {
        let future = Timestamp::from_secs(Timestamp::now().as_secs() + 3600);
        assert_eq!(future.age_secs(), None);
        assert!(!future.is_within(60));
    }

    #[test]
    fn test_timestamp_byte_order() {
        let ts = Timestamp::from_secs(0x0102_0304_0506_0708);
        assert_eq!(ts.to_be_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
