//! # Sale Transaction Processor
//!
//! Creates a sale as one atomic unit.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  create_sale(lines, requested discount, role)                       │
//! │                                                                     │
//! │  1. Validate every line (before any mutation)                       │
//! │  2. Fetch products; note whether any line carries GST               │
//! │  3. Clamp the requested discount to the role/GST cap                │
//! │  4. totals = Σ qty × price, discount = round(total × rate)          │
//! │  5. ┌── TRANSACTION ─────────────────────────────────────────────┐  │
//! │     │  insert sale header                                        │  │
//! │     │  per line: FEFO plan → guarded decrement → sale item       │  │
//! │     │  (a lost guard rolls back and replans from fresh rows)     │  │
//! │     └── COMMIT ─────────────────────────────────────────────────-┘  │
//! │  6. audit "sale.create" - fire-and-forget                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `InsufficientStock` on any line aborts the whole sale; the
//! transaction guarantees no partial batch decrement survives.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::audit::AuditRepository;
use crate::repository::batch::BatchRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_sale_id, generate_sale_item_id, SaleRepository};
use sehat_core::discount::apply_discount_policy;
use sehat_core::fefo::plan_consumption;
use sehat_core::totals::{compute_sale_totals, SaleTotals};
use sehat_core::validation::{
    validate_non_empty, validate_price_paisa, validate_quantity, validate_rate_bps, validate_uuid,
};
use sehat_core::{
    CoreError, DiscountRate, Money, Product, Sale, SaleItem, StaffRole, ValidationError,
    MAX_TRANSACTION_LINES,
};

/// Replans against fresh rows this many times when a stock guard loses.
const STOCK_RETRY_ATTEMPTS: usize = 3;

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested product line. The unit price is accepted from the
/// caller; the catalog price is advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub qty: i64,
    pub unit_price_paisa: i64,
}

/// A sale creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub lines: Vec<SaleLineRequest>,
    /// Requested discount in basis points; silently clamped to the
    /// role/GST cap.
    pub discount_bps: u32,
    pub role: StaffRole,
    pub user_id: Option<String>,
}

/// The outcome of a committed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleOutcome {
    pub sale_id: String,
    pub totals: SaleTotals,
    /// The discount that was actually applied after clamping.
    pub applied_discount: DiscountRate,
}

/// The receipt view of a sale: header plus lines with remaining qty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Service
// =============================================================================

/// The sale transaction processor.
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
}

impl SaleService {
    /// Creates a new SaleService.
    pub fn new(pool: SqlitePool) -> Self {
        SaleService { pool }
    }

    /// Creates a sale: caps the discount, consumes stock FEFO per line,
    /// persists one sale item per consumed batch. Atomic.
    pub async fn create_sale(&self, request: &CreateSaleRequest) -> LedgerResult<CreateSaleOutcome> {
        validate_request(request)?;

        let products = ProductRepository::new(self.pool.clone());
        let batches = BatchRepository::new(self.pool.clone());
        let sales = SaleRepository::new(self.pool.clone());

        // Resolve products up front; existence and the GST flag gate the
        // discount cap. Nothing has been mutated yet.
        let mut has_gst = false;
        for line in &request.lines {
            let product: Product = products
                .get_by_id(&line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            has_gst = has_gst || product.has_gst();
        }

        let applied = apply_discount_policy(
            DiscountRate::from_bps(request.discount_bps),
            request.role,
            has_gst,
        );

        let price_lines: Vec<(i64, Money)> = request
            .lines
            .iter()
            .map(|l| (l.qty, Money::from_paisa(l.unit_price_paisa)))
            .collect();
        let totals = compute_sale_totals(&price_lines, applied);

        'attempts: for attempt in 1..=STOCK_RETRY_ATTEMPTS {
            let mut tx = self.pool.begin().await?;
            let now = Utc::now();

            let sale = Sale {
                id: generate_sale_id(),
                total_paisa: totals.total.paisa(),
                discount_paisa: totals.discount.paisa(),
                net_total_paisa: totals.net_total.paisa(),
                user_id: request.user_id.clone(),
                created_at: now,
                updated_at: now,
            };
            sales.insert_sale(&mut tx, &sale).await?;

            for line in &request.lines {
                let live = batches.live_batches_fefo(&mut tx, &line.product_id).await?;
                let plan = plan_consumption(&line.product_id, &live, line.qty)
                    .map_err(LedgerError::Core)?;

                for take in &plan {
                    let won = batches
                        .decrease_stock(&mut tx, &take.batch_id, take.qty_taken)
                        .await?;
                    if !won {
                        // The optimistic guard lost: stock moved under
                        // the plan. Roll back and replan from fresh rows.
                        tx.rollback().await?;
                        debug!(
                            product_id = %line.product_id,
                            batch_id = %take.batch_id,
                            attempt,
                            "Stock guard lost; replanning sale"
                        );
                        continue 'attempts;
                    }

                    let item = SaleItem {
                        id: generate_sale_item_id(),
                        sale_id: sale.id.clone(),
                        product_id: line.product_id.clone(),
                        batch_id: take.batch_id.clone(),
                        qty: take.qty_taken,
                        unit_price_paisa: line.unit_price_paisa,
                        unit_cost_paisa: take.unit_cost_paisa,
                        discount_bps: applied.bps(),
                        created_at: now,
                    };
                    sales.insert_item(&mut tx, &item).await?;
                }
            }

            tx.commit().await?;

            info!(
                sale_id = %sale.id,
                total = totals.total.paisa(),
                net = totals.net_total.paisa(),
                discount_bps = applied.bps(),
                "Sale created"
            );

            AuditRepository::new(self.pool.clone())
                .record_or_log(
                    request.user_id.as_deref(),
                    "sale.create",
                    json!({
                        "sale_id": sale.id,
                        "total": totals.total.paisa(),
                        "net": totals.net_total.paisa(),
                    }),
                )
                .await;

            return Ok(CreateSaleOutcome {
                sale_id: sale.id,
                totals,
                applied_discount: applied,
            });
        }

        Err(LedgerError::Db(DbError::Internal(format!(
            "sale creation gave up after {STOCK_RETRY_ATTEMPTS} stock contention retries"
        ))))
    }

    /// The receipt read path.
    ///
    /// Lines are filtered to remaining qty > 0; an invoice whose every
    /// line was fully returned reads as not found even though its rows
    /// still exist for reports and audit.
    pub async fn get_receipt(&self, sale_id: &str) -> LedgerResult<Receipt> {
        let sales = SaleRepository::new(self.pool.clone());

        let sale = sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let items = sales.receipt_items(sale_id).await?;
        if items.is_empty() {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        Ok(Receipt { sale, items })
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_request(request: &CreateSaleRequest) -> Result<(), LedgerError> {
    validate_non_empty("lines", &request.lines)?;
    if request.lines.len() > MAX_TRANSACTION_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_TRANSACTION_LINES as i64,
        }
        .into());
    }
    validate_rate_bps(request.discount_bps)?;

    for line in &request.lines {
        validate_uuid("product_id", &line.product_id)?;
        validate_quantity(line.qty)?;
        validate_price_paisa(line.unit_price_paisa)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn request(lines: Vec<SaleLineRequest>, discount_bps: u32, role: StaffRole) -> CreateSaleRequest {
        CreateSaleRequest {
            lines,
            discount_bps,
            role,
            user_id: Some("11111111-1111-4111-8111-111111111111".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sale_consumes_fefo_and_splits_lines() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        let soon = testutil::add_stock(&db, &product_id, "SOON", testutil::date("2024-06-01"), 5, 600).await;
        let late = testutil::add_stock(&db, &product_id, "LATE", testutil::date("2025-01-01"), 10, 700).await;

        let outcome = db
            .sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id: product_id.clone(),
                    qty: 8,
                    unit_price_paisa: 10_000,
                }],
                0,
                StaffRole::Cashier,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.totals.total.paisa(), 80_000);
        assert_eq!(outcome.totals.net_total.paisa(), 80_000);

        // FEFO drained the sooner batch first and split the line
        let receipt = db.sale_service().get_receipt(&outcome.sale_id).await.unwrap();
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].batch_id, soon);
        assert_eq!(receipt.items[0].qty, 5);
        assert_eq!(receipt.items[0].unit_cost_paisa, 600);
        assert_eq!(receipt.items[1].batch_id, late);
        assert_eq!(receipt.items[1].qty, 3);
        assert_eq!(receipt.items[1].unit_cost_paisa, 700);

        assert_eq!(db.batches().get_by_id(&soon).await.unwrap().unwrap().qty, 0);
        assert_eq!(db.batches().get_by_id(&late).await.unwrap().unwrap().qty, 7);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = testutil::test_db().await;
        let ok_product = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        let dry_product = testutil::insert_product(&db, "Augmentin", 50_000, 0).await;
        let batch = testutil::add_stock(&db, &ok_product, "BN-01", None, 5, 600).await;

        let err = db
            .sale_service()
            .create_sale(&request(
                vec![
                    SaleLineRequest {
                        product_id: ok_product.clone(),
                        qty: 3,
                        unit_price_paisa: 10_000,
                    },
                    SaleLineRequest {
                        product_id: dry_product.clone(),
                        qty: 1,
                        unit_price_paisa: 50_000,
                    },
                ],
                0,
                StaffRole::Cashier,
            ))
            .await
            .unwrap_err();

        match err {
            LedgerError::Core(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            }) => {
                assert_eq!(product_id, dry_product);
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The first line's decrement was rolled back with the sale
        assert_eq!(db.batches().get_by_id(&batch).await.unwrap().unwrap().qty, 5);
    }

    #[tokio::test]
    async fn test_discount_clamped_for_non_admin_with_gst() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Calpol", 10_000, 1700).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 10, 600).await;

        // Cashier asks for 50% on a GST-bearing line: clamped to 5%
        let outcome = db
            .sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id: product_id.clone(),
                    qty: 2,
                    unit_price_paisa: 10_000,
                }],
                5000,
                StaffRole::Cashier,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.applied_discount.bps(), 500);
        assert_eq!(outcome.totals.total.paisa(), 20_000);
        assert_eq!(outcome.totals.discount.paisa(), 1_000);
        assert_eq!(outcome.totals.net_total.paisa(), 19_000);

        // The applied rate is stamped on every line
        let receipt = db.sale_service().get_receipt(&outcome.sale_id).await.unwrap();
        assert!(receipt.items.iter().all(|i| i.discount_bps == 500));
    }

    #[tokio::test]
    async fn test_admin_cap_without_gst() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 10, 600).await;

        let outcome = db
            .sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id,
                    qty: 1,
                    unit_price_paisa: 10_000,
                }],
                2000,
                StaffRole::Admin,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.applied_discount.bps(), 1200);
    }

    #[tokio::test]
    async fn test_validation_rejected_before_any_mutation() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        let batch = testutil::add_stock(&db, &product_id, "BN-01", None, 5, 600).await;

        let err = db
            .sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id,
                    qty: 0,
                    unit_price_paisa: 10_000,
                }],
                0,
                StaffRole::Cashier,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert_eq!(db.batches().get_by_id(&batch).await.unwrap().unwrap().qty, 5);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let db = testutil::test_db().await;

        let err = db
            .sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id: "22222222-2222-4222-8222-222222222222".to_string(),
                    qty: 1,
                    unit_price_paisa: 100,
                }],
                0,
                StaffRole::Cashier,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_receipt_unknown_sale_not_found() {
        let db = testutil::test_db().await;
        let err = db.sale_service().get_receipt("no-such-sale").await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_sale_audit_recorded() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 5, 600).await;

        db.sale_service()
            .create_sale(&request(
                vec![SaleLineRequest {
                    product_id,
                    qty: 1,
                    unit_price_paisa: 10_000,
                }],
                0,
                StaffRole::Cashier,
            ))
            .await
            .unwrap();

        let entries = db.audit().list_by_action("sale.create", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
    }
}
