//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Paisa                                        │
//! │    Rs 10.00 = 1000 paisa; every ledger figure is an i64 count of    │
//! │    the smallest unit, so sums reconcile exactly.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sehat_core::money::Money;
//!
//! // Create from paisa (preferred)
//! let price = Money::from_paisa(1099); // Rs 10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                       // Rs 21.98
//! let total = price + Money::from_paisa(500);    // Rs 15.99
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::{DiscountRate, GstRate};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paisa, the smallest rupee unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and adjustments can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paisa.
    ///
    /// ## Example
    /// ```rust
    /// use sehat_core::money::Money;
    ///
    /// let price = Money::from_paisa(1099); // Rs 10.99
    /// assert_eq!(price.paisa(), 1099);
    /// ```
    #[inline]
    pub const fn from_paisa(paisa: i64) -> Self {
        Money(paisa)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paisa.
    #[inline]
    pub const fn paisa(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paisa portion (always 0-99).
    #[inline]
    pub const fn paisa_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps the value into `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use sehat_core::money::Money;
    ///
    /// let unit_price = Money::from_paisa(299);
    /// assert_eq!(unit_price.multiply_quantity(3).paisa(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the share of this amount given by a basis-point fraction,
    /// rounded to the nearest paisa.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides round-half-up (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use sehat_core::money::Money;
    ///
    /// let total = Money::from_paisa(10000); // Rs 100.00
    /// assert_eq!(total.fraction_bps(500).paisa(), 500); // 5% = Rs 5.00
    /// ```
    pub fn fraction_bps(&self, bps: u32) -> Money {
        // i128 prevents overflow on large amounts
        let share = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_paisa(share as i64)
    }

    /// Discount amount for a [`DiscountRate`], rounded to the nearest paisa.
    #[inline]
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        self.fraction_bps(rate.bps())
    }

    /// The amount remaining after a percentage discount.
    ///
    /// ## Example
    /// ```rust
    /// use sehat_core::money::Money;
    /// use sehat_core::types::DiscountRate;
    ///
    /// let price = Money::from_paisa(10000);
    /// let net = price.less_discount(DiscountRate::from_bps(1000)); // 10% off
    /// assert_eq!(net.paisa(), 9000);
    /// ```
    pub fn less_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }

    /// GST amount for a [`GstRate`], rounded to the nearest paisa.
    #[inline]
    pub fn gst_amount(&self, rate: GstRate) -> Money {
        self.fraction_bps(rate.bps())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in a human-readable format.
///
/// For debugging and the seed tool; receipt rendering lives upstream.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.rupees().abs(), self.paisa_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paisa() {
        let money = Money::from_paisa(1099);
        assert_eq!(money.paisa(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paisa_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paisa(1099)), "Rs 10.99");
        assert_eq!(format!("{}", Money::from_paisa(500)), "Rs 5.00");
        assert_eq!(format!("{}", Money::from_paisa(-550)), "-Rs 5.50");
        assert_eq!(format!("{}", Money::from_paisa(0)), "Rs 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paisa(1000);
        let b = Money::from_paisa(500);

        assert_eq!((a + b).paisa(), 1500);
        assert_eq!((a - b).paisa(), 500);
        let result: Money = a * 3;
        assert_eq!(result.paisa(), 3000);
    }

    #[test]
    fn test_fraction_bps_rounding() {
        // Rs 10.00 at 8.25% = 0.825 → rounds to 0.83
        let amount = Money::from_paisa(1000);
        assert_eq!(amount.fraction_bps(825).paisa(), 83);

        // Rs 10.00 at 10% = exactly Rs 1.00
        assert_eq!(amount.fraction_bps(1000).paisa(), 100);
    }

    #[test]
    fn test_less_discount() {
        let subtotal = Money::from_paisa(10000);
        assert_eq!(subtotal.less_discount(DiscountRate::from_bps(1000)).paisa(), 9000);
        assert_eq!(subtotal.less_discount(DiscountRate::from_bps(0)).paisa(), 10000);
    }

    #[test]
    fn test_clamp() {
        let d = Money::from_paisa(1500);
        assert_eq!(d.clamp(Money::zero(), Money::from_paisa(1000)).paisa(), 1000);
        let neg = Money::from_paisa(-5);
        assert_eq!(neg.clamp(Money::zero(), Money::from_paisa(1000)).paisa(), 0);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 30].iter().map(|p| Money::from_paisa(*p)).sum();
        assert_eq!(total.paisa(), 380);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_paisa(100);
        assert!(positive.is_positive());

        let negative = Money::from_paisa(-100);
        assert!(negative.is_negative());
    }
}
