//! # Return / Reconciliation Processor
//!
//! Undoes exactly what a sale did, batch-exact, and keeps the sale
//! header consistent with its shrunken lines.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  create_return(sale_id, lines, reason)                              │
//! │                                                                     │
//! │  ┌── TRANSACTION ──────────────────────────────────────────────┐   │
//! │  │  verify the sale exists                                     │   │
//! │  │  per line: load the sale item, verify it belongs to the     │   │
//! │  │    sale, reject qty > remaining (ReturnExceedsRemaining)    │   │
//! │  │  refund price = unit price × (1 − effective discount)       │   │
//! │  │  insert return header + items (carrying frozen unit_cost)   │   │
//! │  │  per line: restore_stock onto the originating batch,        │   │
//! │  │    shrink the sale item's qty                               │   │
//! │  │  recompute sale totals from the surviving items             │   │
//! │  └── COMMIT ──────────────────────────────────────────────────-┘   │
//! │  audit "return.create" - fire-and-forget                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are never deleted: a line's remaining qty shrinks so that
//! "originally sold" stays reconstructible as qty + Σ returned.
//!
//! The repair pass shares the totals recomputation: it clamps corrupted
//! (negative or NULL) line quantities to zero and re-derives every
//! affected sale's header. Running it twice changes nothing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::repository::audit::AuditRepository;
use crate::repository::batch::BatchRepository;
use crate::repository::returns::{
    generate_return_id, generate_return_item_id, ReturnRepository,
};
use crate::repository::sale::SaleRepository;
use sehat_core::totals::{recompute_sale_totals, refund_unit_price, SaleTotals};
use sehat_core::validation::{
    validate_non_empty, validate_price_paisa, validate_quantity, validate_rate_bps, validate_uuid,
};
use sehat_core::{CoreError, DiscountRate, Money, Return, ReturnItem, SaleItem};

use std::collections::HashMap;

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested return line. The caller names the sale line and echoes
/// its product/batch references; a mismatch is treated as not-found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLineRequest {
    pub sale_item_id: String,
    pub product_id: String,
    pub batch_id: String,
    pub qty: i64,
    /// The price being refunded against, normally the line's frozen
    /// unit price.
    pub unit_price_paisa: i64,
    /// Optional discount override in bps; defaults to the sale line's
    /// stamped rate. Allows a corrected discount without mutating the
    /// original line.
    pub discount_bps: Option<u32>,
}

/// A return creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReturnRequest {
    pub sale_id: String,
    pub lines: Vec<ReturnLineRequest>,
    pub reason: Option<String>,
    pub user_id: Option<String>,
}

/// The outcome of a committed return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReturnOutcome {
    pub return_id: String,
    /// Total refunded (Σ qty × refund unit price).
    pub total: Money,
    /// The sale's totals after reconciliation.
    pub sale_totals: SaleTotals,
}

/// The outcome of a repair pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// Corrupted lines clamped to zero.
    pub lines_clamped: u64,
    /// Sales whose totals were re-derived.
    pub sales_repaired: u64,
}

// =============================================================================
// Service
// =============================================================================

/// The return/reconciliation processor.
#[derive(Debug, Clone)]
pub struct ReturnService {
    pool: SqlitePool,
}

impl ReturnService {
    /// Creates a new ReturnService.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnService { pool }
    }

    /// Creates a return against a sale. Atomic: return rows, stock
    /// restoration, line shrinks and the header recomputation commit
    /// together.
    pub async fn create_return(
        &self,
        request: &CreateReturnRequest,
    ) -> LedgerResult<CreateReturnOutcome> {
        validate_request(request)?;

        let sales = SaleRepository::new(self.pool.clone());
        let returns = ReturnRepository::new(self.pool.clone());
        let batches = BatchRepository::new(self.pool.clone());

        let mut tx = self.pool.begin().await?;

        let sale = sales
            .get_in_tx(&mut tx, &request.sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(request.sale_id.clone()))?;

        // Pass 1: load and verify every line, pricing the refund.
        // Nothing is written until the whole request checks out.
        let mut prepared: Vec<(SaleItem, Money)> = Vec::with_capacity(request.lines.len());
        let mut requested_so_far: HashMap<String, i64> = HashMap::new();

        for line in &request.lines {
            let item = sales
                .get_item(&mut tx, &line.sale_item_id)
                .await?
                .filter(|i| {
                    i.sale_id == request.sale_id
                        && i.product_id == line.product_id
                        && i.batch_id == line.batch_id
                })
                .ok_or_else(|| CoreError::SaleItemNotFound(line.sale_item_id.clone()))?;

            // The line's current qty is already original minus prior
            // returns; earlier lines of this same request count too.
            let taken = requested_so_far.entry(item.id.clone()).or_insert(0);
            let remaining = item.qty - *taken;
            if line.qty > remaining {
                return Err(CoreError::ReturnExceedsRemaining {
                    sale_item_id: item.id.clone(),
                    remaining,
                    requested: line.qty,
                }
                .into());
            }
            *taken += line.qty;

            let effective = line
                .discount_bps
                .map(DiscountRate::from_bps)
                .unwrap_or_else(|| item.discount_rate());
            let refund_unit = refund_unit_price(Money::from_paisa(line.unit_price_paisa), effective);

            prepared.push((item, refund_unit));
        }

        let total: Money = request
            .lines
            .iter()
            .zip(&prepared)
            .map(|(line, (_, refund_unit))| refund_unit.multiply_quantity(line.qty))
            .sum();

        let now = Utc::now();
        let ret = Return {
            id: generate_return_id(),
            sale_id: request.sale_id.clone(),
            total_paisa: total.paisa(),
            reason: request.reason.clone(),
            user_id: request.user_id.clone(),
            created_at: now,
        };
        returns.insert_return(&mut tx, &ret).await?;

        // Pass 2: write the return lines, restore stock onto the exact
        // originating batches, shrink the sale lines.
        for (line, (item, refund_unit)) in request.lines.iter().zip(&prepared) {
            let return_item = ReturnItem {
                id: generate_return_item_id(),
                return_id: ret.id.clone(),
                sale_item_id: item.id.clone(),
                product_id: item.product_id.clone(),
                batch_id: item.batch_id.clone(),
                qty: line.qty,
                unit_price_paisa: refund_unit.paisa(),
                unit_cost_paisa: item.unit_cost_paisa,
                created_at: now,
            };
            returns.insert_item(&mut tx, &return_item).await?;

            batches.restore_stock(&mut tx, &item.batch_id, line.qty).await?;

            let shrunk = sales.shrink_item_qty(&mut tx, &item.id, line.qty).await?;
            if !shrunk {
                // The line moved underneath us; abort the whole return.
                return Err(CoreError::ReturnExceedsRemaining {
                    sale_item_id: item.id.clone(),
                    remaining: 0,
                    requested: line.qty,
                }
                .into());
            }
        }

        // Reconcile the header against the surviving lines.
        let items = sales.get_items(&mut tx, &request.sale_id).await?;
        let sale_totals = recompute_sale_totals(&items, sale.discount());
        sales.update_totals(&mut tx, &request.sale_id, &sale_totals).await?;

        tx.commit().await?;

        info!(
            return_id = %ret.id,
            sale_id = %request.sale_id,
            total = total.paisa(),
            "Return created"
        );

        AuditRepository::new(self.pool.clone())
            .record_or_log(
                request.user_id.as_deref(),
                "return.create",
                json!({
                    "return_id": ret.id,
                    "sale_id": request.sale_id,
                    "total": total.paisa(),
                }),
            )
            .await;

        Ok(CreateReturnOutcome {
            return_id: ret.id,
            total,
            sale_totals,
        })
    }

    /// Administrative repair: clamps corrupted (negative or NULL) sale
    /// line quantities to zero and re-derives totals for every affected
    /// sale. Idempotent; corruption is corrected in place and warned
    /// about, never fatal.
    pub async fn repair_sales(&self) -> LedgerResult<RepairOutcome> {
        let sales = SaleRepository::new(self.pool.clone());

        let mut tx = self.pool.begin().await?;

        let affected = sales.corrupted_sale_ids(&mut tx).await?;
        let lines_clamped = sales.clamp_corrupted_items(&mut tx).await?;

        let mut sales_repaired = 0u64;
        for sale_id in &affected {
            let Some(sale) = sales.get_in_tx(&mut tx, sale_id).await? else {
                warn!(sale_id = %sale_id, "Orphaned sale items found during repair");
                continue;
            };

            let items = sales.get_items(&mut tx, sale_id).await?;
            let totals = recompute_sale_totals(&items, sale.discount());
            sales.update_totals(&mut tx, sale_id, &totals).await?;
            sales_repaired += 1;

            warn!(
                sale_id = %sale_id,
                total = totals.total.paisa(),
                net = totals.net_total.paisa(),
                "Repaired sale with corrupted line quantities"
            );
        }

        tx.commit().await?;

        if lines_clamped > 0 {
            info!(lines_clamped, sales_repaired, "Repair pass complete");
        }

        Ok(RepairOutcome {
            lines_clamped,
            sales_repaired,
        })
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_request(request: &CreateReturnRequest) -> Result<(), LedgerError> {
    validate_non_empty("items", &request.lines)?;

    for line in &request.lines {
        validate_uuid("sale_item_id", &line.sale_item_id)?;
        validate_uuid("product_id", &line.product_id)?;
        validate_uuid("batch_id", &line.batch_id)?;
        validate_quantity(line.qty)?;
        validate_price_paisa(line.unit_price_paisa)?;
        if let Some(bps) = line.discount_bps {
            validate_rate_bps(bps)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
