//! # Profit & COGS Report Arithmetic
//!
//! Pure aggregation over prepared row inputs. The storage layer fetches
//! the rows (sale items with their returned sums, return items joined to
//! their parent sale, the expense total); this module reconstructs
//! pre-return figures and derives the summary.
//!
//! ## Reconstruction
//! The ledger mutates on return: a sale line's `qty` is the remaining
//! quantity. Reporting always works on
//! `original_qty = qty + returned_qty`, so a sale and its later partial
//! return cancel inside one window instead of distorting two.
//!
//! ## Date Attribution
//! Returns are attributed to the **original sale's date**, not their
//! own: a sale in period A returned in period B affects only period A's
//! figures. The storage query enforces this by filtering return items on
//! the parent sale's date.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::DiscountRate;

// =============================================================================
// Row Inputs
// =============================================================================

/// One sale line in range, with its return history and cost fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldLine {
    pub sale_id: String,
    pub product_name: String,
    /// Remaining (un-returned) quantity.
    pub qty: i64,
    /// Total quantity returned against this line.
    pub returned_qty: i64,
    pub unit_price: Money,
    /// The line's frozen cost; zero means the cost was missing at sale
    /// time.
    pub unit_cost: Money,
    /// The batch's current cost, used as fallback when the frozen cost
    /// is zero or negative.
    pub batch_cost: Money,
    pub discount: DiscountRate,
}

impl SoldLine {
    /// The quantity as originally sold, before any return.
    #[inline]
    pub fn original_qty(&self) -> i64 {
        self.qty + self.returned_qty
    }

    /// The cost basis actually used: frozen cost, else batch fallback.
    fn effective_unit_cost(&self) -> Money {
        if self.unit_cost.is_positive() {
            self.unit_cost
        } else {
            self.batch_cost
        }
    }
}

/// One return line whose parent sale falls in range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnedLine {
    pub qty: i64,
    /// The discount-adjusted refund price per unit.
    pub unit_price: Money,
    pub unit_cost: Money,
}

// =============================================================================
// Output
// =============================================================================

/// One rendered report row (per sale line, pre-return figures).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub sale_id: String,
    pub product_name: String,
    pub original_qty: i64,
    pub returned_qty: i64,
    pub unit_price: Money,
    pub gross: Money,
    pub discount: Money,
    pub cogs: Money,
}

/// The profit summary for a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitSummary {
    /// Σ original_qty × unit_price.
    pub gross_sales: Money,
    /// Σ per-line discount amounts.
    pub discounts: Money,
    /// gross_sales − discounts.
    pub net_sales: Money,
    /// Σ return qty × refund unit price (sale-date attributed).
    pub returns: Money,
    /// Σ return qty × frozen unit cost (sale-date attributed).
    pub returns_cogs: Money,
    /// Σ expenses in range.
    pub expenses: Money,
    /// Σ original_qty × effective unit cost (pre-return COGS).
    pub cogs: Money,
    /// net_sales − returns.
    pub actual_revenue: Money,
    /// cogs − returns_cogs.
    pub actual_cogs: Money,
    /// actual_revenue − actual_cogs.
    pub gross_profit: Money,
    /// gross_profit − expenses.
    pub net_profit: Money,
    /// actual_revenue − expenses (cash-basis, cost-agnostic).
    pub net_cash: Money,
    /// Lines whose cost stayed ≤ 0 even after the batch fallback;
    /// profit is understated by their unknown cost.
    pub missing_cost_lines: u64,
}

/// The full report payload: per-line rows plus the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitReport {
    pub rows: Vec<ReportRow>,
    pub summary: ProfitSummary,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Builds the profit report from prepared inputs.
pub fn summarize(lines: &[SoldLine], returns: &[ReturnedLine], expenses: Money) -> ProfitReport {
    let mut gross_sales = Money::zero();
    let mut discounts = Money::zero();
    let mut cogs = Money::zero();
    let mut missing_cost_lines: u64 = 0;
    let mut rows = Vec::with_capacity(lines.len());

    for line in lines {
        let original_qty = line.original_qty();
        let gross = line.unit_price.multiply_quantity(original_qty);
        let discount = gross.discount_amount(line.discount);

        let effective_cost = line.effective_unit_cost();
        let line_cogs = if effective_cost.is_positive() {
            effective_cost.multiply_quantity(original_qty)
        } else {
            missing_cost_lines += 1;
            Money::zero()
        };

        gross_sales += gross;
        discounts += discount;
        cogs += line_cogs;

        rows.push(ReportRow {
            sale_id: line.sale_id.clone(),
            product_name: line.product_name.clone(),
            original_qty,
            returned_qty: line.returned_qty,
            unit_price: line.unit_price,
            gross,
            discount,
            cogs: line_cogs,
        });
    }

    let returns_revenue: Money = returns
        .iter()
        .map(|r| r.unit_price.multiply_quantity(r.qty))
        .sum();
    let returns_cogs: Money = returns
        .iter()
        .map(|r| r.unit_cost.multiply_quantity(r.qty))
        .sum();

    let net_sales = gross_sales - discounts;
    let actual_revenue = net_sales - returns_revenue;
    let actual_cogs = cogs - returns_cogs;
    let gross_profit = actual_revenue - actual_cogs;

    ProfitReport {
        rows,
        summary: ProfitSummary {
            gross_sales,
            discounts,
            net_sales,
            returns: returns_revenue,
            returns_cogs,
            expenses,
            cogs,
            actual_revenue,
            actual_cogs,
            gross_profit,
            net_profit: gross_profit - expenses,
            net_cash: actual_revenue - expenses,
            missing_cost_lines,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: i64, returned: i64, price: i64, cost: i64, batch_cost: i64, bps: u32) -> SoldLine {
        SoldLine {
            sale_id: "s-1".to_string(),
            product_name: "Panadol".to_string(),
            qty,
            returned_qty: returned,
            unit_price: Money::from_paisa(price),
            unit_cost: Money::from_paisa(cost),
            batch_cost: Money::from_paisa(batch_cost),
            discount: DiscountRate::from_bps(bps),
        }
    }

    #[test]
    fn test_reconstruction_with_in_window_return() {
        // Sale of 10 @ 100.00 with a return of 4: gross 1000, returns
        // 400, actual revenue 600, independent of the return's own date
        // (the storage query already attributed it to the sale's date).
        let lines = vec![line(6, 4, 10000, 6000, 0, 0)];
        let returns = vec![ReturnedLine {
            qty: 4,
            unit_price: Money::from_paisa(10000),
            unit_cost: Money::from_paisa(6000),
        }];

        let report = summarize(&lines, &returns, Money::zero());
        let s = &report.summary;

        assert_eq!(s.gross_sales.paisa(), 100_000);
        assert_eq!(s.returns.paisa(), 40_000);
        assert_eq!(s.actual_revenue.paisa(), 60_000);
        assert_eq!(s.cogs.paisa(), 60_000);
        assert_eq!(s.returns_cogs.paisa(), 24_000);
        assert_eq!(s.actual_cogs.paisa(), 36_000);
        assert_eq!(s.gross_profit.paisa(), 24_000);
    }

    #[test]
    fn test_discounts_on_original_qty() {
        // 5% stamped on the line applies to the reconstructed quantity
        let lines = vec![line(8, 2, 1000, 600, 0, 500)];
        let report = summarize(&lines, &[], Money::zero());
        let s = &report.summary;

        assert_eq!(s.gross_sales.paisa(), 10_000);
        assert_eq!(s.discounts.paisa(), 500);
        assert_eq!(s.net_sales.paisa(), 9_500);
    }

    #[test]
    fn test_cost_fallback_to_batch() {
        // Frozen cost of zero falls back to the batch's current cost
        let lines = vec![line(5, 0, 1000, 0, 700, 0)];
        let report = summarize(&lines, &[], Money::zero());

        assert_eq!(report.summary.cogs.paisa(), 3_500);
        assert_eq!(report.summary.missing_cost_lines, 0);
    }

    #[test]
    fn test_missing_cost_counter() {
        // Neither the line nor the batch carries a usable cost
        let lines = vec![line(5, 0, 1000, 0, 0, 0), line(2, 0, 500, 300, 0, 0)];
        let report = summarize(&lines, &[], Money::zero());

        assert_eq!(report.summary.missing_cost_lines, 1);
        assert_eq!(report.summary.cogs.paisa(), 600);
    }

    #[test]
    fn test_expenses_split_profit_and_cash() {
        let lines = vec![line(10, 0, 1000, 600, 0, 0)];
        let report = summarize(&lines, &[], Money::from_paisa(1_500));
        let s = &report.summary;

        assert_eq!(s.gross_profit.paisa(), 4_000);
        assert_eq!(s.net_profit.paisa(), 2_500);
        assert_eq!(s.net_cash.paisa(), 8_500);
    }

    #[test]
    fn test_rows_mirror_lines() {
        let lines = vec![line(6, 4, 10000, 6000, 0, 500)];
        let report = summarize(&lines, &[], Money::zero());

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.original_qty, 10);
        assert_eq!(row.returned_qty, 4);
        assert_eq!(row.gross.paisa(), 100_000);
        assert_eq!(row.discount.paisa(), 5_000);
        assert_eq!(row.cogs.paisa(), 60_000);
    }

    #[test]
    fn test_empty_range() {
        let report = summarize(&[], &[], Money::zero());
        assert!(report.rows.is_empty());
        assert_eq!(report.summary.gross_sales.paisa(), 0);
        assert_eq!(report.summary.net_profit.paisa(), 0);
    }
}
