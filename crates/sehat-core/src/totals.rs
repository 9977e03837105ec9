//! # Sale Totals & Reconciliation
//!
//! The arithmetic that keeps a sale header consistent with its lines.
//!
//! Two moments need it:
//! - **Sale time**: totals computed from the requested lines plus the
//!   clamped discount rate.
//! - **Return/repair time**: totals re-derived from the surviving
//!   (post-shrink) sale items and the header's existing absolute
//!   discount. Both callers share [`recompute_sale_totals`] so the
//!   formula exists exactly once.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{DiscountRate, SaleItem};

// =============================================================================
// Totals
// =============================================================================

/// A sale header's three derived figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    /// Sum of line extensions before discount.
    pub total: Money,
    /// Absolute discount, always within [0, total].
    pub discount: Money,
    /// total − discount.
    pub net_total: Money,
}

/// Computes sale-time totals from requested lines and the applied
/// (already clamped) discount rate.
///
/// `discount = round(total × rate)`, then `net = total − discount`.
pub fn compute_sale_totals(lines: &[(i64, Money)], applied: DiscountRate) -> SaleTotals {
    let total: Money = lines
        .iter()
        .map(|(qty, unit_price)| unit_price.multiply_quantity(*qty))
        .sum();
    let discount = total.discount_amount(applied);

    SaleTotals {
        total,
        discount,
        net_total: total - discount,
    }
}

/// Re-derives a sale's totals from its current (post-return) items.
///
/// `total` is the flat, undiscounted sum over remaining quantities; the
/// existing absolute discount is clamped into `[0, total]` rather than
/// re-scaled. Invoked by the return flow after shrinking lines and by
/// the repair flow after zeroing corrupted quantities.
pub fn recompute_sale_totals(items: &[SaleItem], existing_discount: Money) -> SaleTotals {
    let total: Money = items.iter().map(|item| item.line_total()).sum();
    let discount = existing_discount.clamp(Money::zero(), total);

    SaleTotals {
        total,
        discount,
        net_total: total - discount,
    }
}

/// The effective per-unit refund price for a returned line:
/// `unit_price × (1 − discount)`, rounded per unit.
#[inline]
pub fn refund_unit_price(unit_price: Money, effective: DiscountRate) -> Money {
    unit_price.less_discount(effective)
}

// =============================================================================
// Unit Tests
// =============================================================================
