//! # FEFO Consumption Planning
//!
//! First-Expiry-First-Out selection over a product's live batches.
//!
//! ## How Consumption Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Request: 12 units of Panadol                                       │
//! │                                                                     │
//! │  Batches (FEFO order):                                              │
//! │    BN-07  expiry 2024-06-01  qty  5   ──► take 5                    │
//! │    BN-11  expiry 2025-01-01  qty 10   ──► take 7                    │
//! │    BN-02  expiry NULL        qty 40   ──► untouched                 │
//! │                                                                     │
//! │  Plan: [(BN-07, 5, cost@BN-07), (BN-11, 7, cost@BN-11)]             │
//! │  Each entry becomes one sale line carrying that batch's cost.       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning here is pure; the storage layer applies the plan inside the
//! sale transaction with guarded decrements, so a plan that loses a race
//! is simply re-built against fresh rows.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Batch;

// =============================================================================
// Consumption Plan
// =============================================================================

/// One planned take from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTake {
    pub batch_id: String,
    pub qty_taken: i64,
    /// The batch's weighted-average cost at the moment of planning;
    /// frozen onto the sale line.
    pub unit_cost_paisa: i64,
}

impl BatchTake {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_paisa(self.unit_cost_paisa)
    }
}

// =============================================================================
// FEFO Ordering
// =============================================================================

/// FEFO comparator: expiry ascending, NULL expiry last, id ascending as
/// the tie-break so batches sharing an expiry (or lacking one) order
/// deterministically.
pub fn fefo_cmp(a: &Batch, b: &Batch) -> Ordering {
    match (a.expiry, b.expiry) {
        (Some(ea), Some(eb)) => ea.cmp(&eb).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

/// Sorts batches into FEFO consumption order.
pub fn sort_fefo(batches: &mut [Batch]) {
    batches.sort_by(fefo_cmp);
}

// =============================================================================
// Greedy Planner
// =============================================================================

/// Builds a consumption plan for `requested` units of a product.
///
/// Batches with zero quantity are skipped; the rest are taken greedily
/// in FEFO order, `min(remaining, batch.qty)` each. If the batches run
/// out first the whole plan fails with `InsufficientStock` carrying the
/// total that was available.
///
/// ## Guarantees
/// - Σ qty_taken == requested on success
/// - Σ qty_taken never exceeds the quantity available before the call
/// - Entry order is the FEFO order, one entry per touched batch
pub fn plan_consumption(
    product_id: &str,
    batches: &[Batch],
    requested: i64,
) -> CoreResult<Vec<BatchTake>> {
    let mut ordered: Vec<&Batch> = batches.iter().filter(|b| b.qty > 0).collect();
    ordered.sort_by(|a, b| fefo_cmp(a, b));

    let mut plan = Vec::new();
    let mut remaining = requested;

    for batch in ordered {
        if remaining == 0 {
            break;
        }

        let take = remaining.min(batch.qty);
        plan.push(BatchTake {
            batch_id: batch.id.clone(),
            qty_taken: take,
            unit_cost_paisa: batch.cost_paisa,
        });
        remaining -= take;
    }

    if remaining > 0 {
        let available: i64 = batches.iter().map(|b| b.qty.max(0)).sum();
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested,
        });
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn batch(id: &str, expiry: Option<&str>, qty: i64, cost_paisa: i64) -> Batch {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Batch {
            id: id.to_string(),
            product_id: "prod-1".to_string(),
            batch_no: format!("BN-{id}"),
            expiry: expiry.map(|e| NaiveDate::parse_from_str(e, "%Y-%m-%d").unwrap()),
            qty,
            cost_paisa,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_fefo_order_soonest_expiry_first_null_last() {
        // Given [2025-01-01, null, 2024-06-01], consumption draws
        // 2024-06-01 first, then 2025-01-01, then the null-expiry batch.
        let batches = vec![
            batch("a", Some("2025-01-01"), 5, 100),
            batch("b", None, 5, 100),
            batch("c", Some("2024-06-01"), 5, 100),
        ];

        let plan = plan_consumption("prod-1", &batches, 12).unwrap();
        let ids: Vec<&str> = plan.iter().map(|t| t.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(plan[0].qty_taken, 5);
        assert_eq!(plan[1].qty_taken, 5);
        assert_eq!(plan[2].qty_taken, 2);
    }

    #[test]
    fn test_fefo_tie_breaks_by_id() {
        let batches = vec![
            batch("b", Some("2024-06-01"), 5, 100),
            batch("a", Some("2024-06-01"), 5, 100),
        ];

        let plan = plan_consumption("prod-1", &batches, 6).unwrap();
        assert_eq!(plan[0].batch_id, "a");
        assert_eq!(plan[1].batch_id, "b");

        // Null-expiry batches also order by id
        let batches = vec![batch("z", None, 5, 100), batch("y", None, 5, 100)];
        let plan = plan_consumption("prod-1", &batches, 6).unwrap();
        assert_eq!(plan[0].batch_id, "y");
    }

    #[test]
    fn test_conservation() {
        let batches = vec![
            batch("a", Some("2024-06-01"), 3, 100),
            batch("b", Some("2025-01-01"), 9, 100),
        ];
        let available: i64 = batches.iter().map(|b| b.qty).sum();

        let plan = plan_consumption("prod-1", &batches, 7).unwrap();
        let taken: i64 = plan.iter().map(|t| t.qty_taken).sum();
        assert_eq!(taken, 7);
        assert!(taken <= available);
    }

    #[test]
    fn test_single_batch_satisfies_without_split() {
        let batches = vec![
            batch("a", Some("2024-06-01"), 10, 100),
            batch("b", Some("2025-01-01"), 10, 100),
        ];

        let plan = plan_consumption("prod-1", &batches, 10).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, "a");
    }

    #[test]
    fn test_insufficient_stock() {
        let batches = vec![batch("a", Some("2024-06-01"), 3, 100)];

        let err = plan_consumption("prod-1", &batches, 5).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, "prod-1");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_batches_skipped() {
        let batches = vec![
            batch("a", Some("2024-06-01"), 0, 100),
            batch("b", Some("2025-01-01"), 5, 100),
        ];

        let plan = plan_consumption("prod-1", &batches, 5).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, "b");
    }

    #[test]
    fn test_plan_carries_batch_cost() {
        let batches = vec![
            batch("a", Some("2024-06-01"), 2, 750),
            batch("b", Some("2025-01-01"), 2, 900),
        ];

        let plan = plan_consumption("prod-1", &batches, 3).unwrap();
        assert_eq!(plan[0].unit_cost_paisa, 750);
        assert_eq!(plan[1].unit_cost_paisa, 900);
    }
}
