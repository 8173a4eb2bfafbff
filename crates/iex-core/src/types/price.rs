//! Fixed-point price with four implied decimal places.

use std::cmp::Ordering;
use std::fmt;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{PRICE_DECIMALS, PRICE_SCALE};

/// Fixed-point price as carried on the wire.
///
/// The raw `i64` is the price multiplied by 10,000, so `123456` is `12.3456`.
/// Rendering splits the integer into whole units and ten-thousandths; no
/// floating point is involved.
///
/// # Example
///
/// ```rust
/// use iex_core::types::Price;
///
/// let price = Price::from_raw(123_456);
/// assert_eq!(price.integer_part(), 12);
/// assert_eq!(price.fractional_part(), 3456);
/// assert_eq!(price.to_string(), "12.3456");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct Price(i64);

impl Price {
    /// Zero price constant
    pub const ZERO: Self = Self(0);

    /// Create a price from its raw wire value
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw wire value
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole currency units, truncated toward zero
    #[inline]
    #[must_use]
    pub const fn integer_part(self) -> i64 {
        self.0 / PRICE_SCALE
    }

    /// Remainder after removing [`Price::integer_part`], in ten-thousandths.
    ///
    /// In `0..=9999` for non-negative prices; carries the sign of the price
    /// otherwise.
    #[inline]
    #[must_use]
    pub const fn fractional_part(self) -> i64 {
        self.0 - self.integer_part() * PRICE_SCALE
    }

    /// Check if the price is zero
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Check if the price is negative
    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl PartialOrd for Price {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Price({})", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:0width$}",
            self.integer_part().unsigned_abs(),
            self.fractional_part().unsigned_abs(),
            width = PRICE_DECIMALS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_fraction() {
        let p = Price::from_raw(123_456);
        assert_eq!(p.integer_part(), 12);
        assert_eq!(p.fractional_part(), 3456);
    }

    #[test]
    fn test_fraction_range_non_negative() {
        for raw in [0, 1, 9_999, 10_000, 10_001, 1_234_567_890] {
            let frac = Price::from_raw(raw).fractional_part();
            assert!((0..PRICE_SCALE).contains(&frac), "raw={raw} frac={frac}");
        }
    }

    #[test]
    fn test_display_four_digits() {
        assert_eq!(Price::from_raw(123_456).to_string(), "12.3456");
        assert_eq!(Price::from_raw(1_000_100).to_string(), "100.0100");
        assert_eq!(Price::from_raw(5).to_string(), "0.0005");
        assert_eq!(Price::ZERO.to_string(), "0.0000");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_raw(-15_000).to_string(), "-1.5000");
        assert_eq!(Price::from_raw(-5).to_string(), "-0.0005");
    }

    #[test]
    fn test_ordering() {
        let bid = Price::from_raw(100_000);
        let ask = Price::from_raw(100_100);
        assert!(bid < ask);
        assert!(Price::from_raw(-1).is_negative());
        assert!(Price::ZERO.is_zero());
    }
}
