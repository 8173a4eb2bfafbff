//! Nanosecond-precision timestamp as carried on the wire.

use std::cmp::Ordering;
use std::fmt;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{NS_PER_MS, NS_PER_SEC};

/// Nanoseconds since the Unix epoch.
///
/// Wire timestamps are signed 64-bit values. Negative values are outside the
/// defined domain; they are kept as-is so callers can flag them, and split
/// and render as instants before the epoch.
///
/// # Example
///
/// ```rust
/// use iex_core::types::Timestamp;
///
/// let ts = Timestamp::from_nanos(1_500_000_000_123_456_789);
/// assert_eq!(ts.as_secs(), 1_500_000_000);
/// assert_eq!(ts.subsec_nanos(), 123_456_789);
/// ```
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Zero timestamp (Unix epoch)
    pub const EPOCH: Self = Self(0);

    /// Create a timestamp from nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * NS_PER_MS as i64)
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NS_PER_SEC as i64)
    }

    /// Get nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Get whole seconds since epoch, rounded toward negative infinity
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0.div_euclid(NS_PER_SEC as i64)
    }

    /// Get the nanosecond remainder after [`Timestamp::as_secs`], always in
    /// `0..1_000_000_000`
    #[inline]
    #[must_use]
    pub const fn subsec_nanos(self) -> u32 {
        self.0.rem_euclid(NS_PER_SEC as i64) as u32
    }

    /// Split into `(seconds, nanoseconds)`
    #[inline]
    #[must_use]
    pub const fn to_parts(self) -> (i64, u32) {
        (self.as_secs(), self.subsec_nanos())
    }

    /// Check whether the value is inside the defined (non-negative) domain
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Convert to chrono `DateTime`
    #[inline]
    #[must_use]
    pub fn to_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        let (secs, nsecs) = self.to_parts();
        chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or_default()
    }
}

impl PartialOrd for Timestamp {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.to_datetime();
        write!(f, "{} UTC", dt.format("%Y-%m-%d %H:%M:%S%.9f"))
    }
}
