//! # Weighted-Average Costing
//!
//! Cost basis math for the batch ledger.
//!
//! A batch's cost is re-blended every time a purchase merges new stock
//! into an existing (product, batch_no) row:
//!
//! ```text
//! new_cost = (old_qty · old_cost + added_qty · unit_cost)
//!            ─────────────────────────────────────────────
//!                       old_qty + added_qty
//! ```
//!
//! Sales and returns never change a batch's cost, only its quantity;
//! sale lines freeze the cost they consumed at.

use crate::money::Money;

/// Blends an existing batch cost with an incoming purchase.
///
/// Falls back to `unit_cost` when the combined quantity is zero. Rounds
/// to the nearest paisa (half up), in i128 so large ledgers cannot
/// overflow.
///
/// ## Example
/// ```rust
/// use sehat_core::costing::weighted_average_cost;
/// use sehat_core::money::Money;
///
/// // 5 on hand @ Rs 10.00, buy 5 more @ Rs 20.00 → Rs 15.00 exactly
/// let blended = weighted_average_cost(5, Money::from_paisa(1000), 5, Money::from_paisa(2000));
/// assert_eq!(blended.paisa(), 1500);
/// ```
pub fn weighted_average_cost(
    old_qty: i64,
    old_cost: Money,
    added_qty: i64,
    unit_cost: Money,
) -> Money {
    let denominator = old_qty + added_qty;
    if denominator <= 0 {
        return unit_cost;
    }

    let numerator =
        old_qty as i128 * old_cost.paisa() as i128 + added_qty as i128 * unit_cost.paisa() as i128;
    let blended = (numerator + denominator as i128 / 2) / denominator as i128;

    Money::from_paisa(blended as i64)
}

// =============================================================================
// Unit Tests
// =============================================================================
