//! # Purchase Processor
//!
//! Stock intake. Each received line feeds the batch ledger: the first
//! purchase of a (product, batch_no) creates the batch, later purchases
//! merge with weighted-average costing. The purchase rows themselves are
//! the paper trail; the batch ledger is what sales consume.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::repository::audit::AuditRepository;
use crate::repository::batch::BatchRepository;
use crate::repository::product::ProductRepository;
use sehat_core::validation::{
    validate_batch_no, validate_non_empty, validate_price_paisa, validate_quantity, validate_uuid,
};
use sehat_core::{CoreError, Money, Purchase, PurchaseItem};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One received line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineRequest {
    pub product_id: String,
    pub batch_no: String,
    pub expiry: Option<NaiveDate>,
    pub qty: i64,
    pub unit_cost_paisa: i64,
}

/// A stock intake request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPurchaseRequest {
    pub supplier: Option<String>,
    pub invoice_no: Option<String>,
    pub lines: Vec<PurchaseLineRequest>,
    pub user_id: Option<String>,
}

/// The outcome of a committed purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPurchaseOutcome {
    pub purchase_id: String,
    /// Σ qty × unit cost across the received lines.
    pub total: Money,
}

// =============================================================================
// Service
// =============================================================================

/// The purchase (stock intake) processor.
#[derive(Debug, Clone)]
pub struct PurchaseService {
    pool: SqlitePool,
}

impl PurchaseService {
    /// Creates a new PurchaseService.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseService { pool }
    }

    /// Records a purchase and adds its stock to the batch ledger.
    /// Atomic: header, lines and every batch mutation commit together.
    pub async fn record_purchase(
        &self,
        request: &RecordPurchaseRequest,
    ) -> LedgerResult<RecordPurchaseOutcome> {
        validate_request(request)?;

        let products = ProductRepository::new(self.pool.clone());
        let batches = BatchRepository::new(self.pool.clone());

        for line in &request.lines {
            products
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        }

        let total: Money = request
            .lines
            .iter()
            .map(|l| Money::from_paisa(l.unit_cost_paisa).multiply_quantity(l.qty))
            .sum();

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            supplier: request.supplier.clone(),
            invoice_no: request.invoice_no.clone(),
            total_paisa: total.paisa(),
            user_id: request.user_id.clone(),
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO purchases (id, supplier, invoice_no, total_paisa, user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&purchase.id)
        .bind(&purchase.supplier)
        .bind(&purchase.invoice_no)
        .bind(purchase.total_paisa)
        .bind(&purchase.user_id)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &request.lines {
            let batch = batches
                .increase_stock(
                    &mut tx,
                    &line.product_id,
                    line.batch_no.trim(),
                    line.expiry,
                    line.qty,
                    Money::from_paisa(line.unit_cost_paisa),
                )
                .await?;

            let item = PurchaseItem {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase.id.clone(),
                product_id: line.product_id.clone(),
                batch_id: batch.id,
                batch_no: line.batch_no.trim().to_string(),
                expiry: line.expiry,
                qty: line.qty,
                unit_cost_paisa: line.unit_cost_paisa,
                created_at: now,
            };

            sqlx::query(
                "INSERT INTO purchase_items ( \
                    id, purchase_id, product_id, batch_id, batch_no, expiry, \
                    qty, unit_cost_paisa, created_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&item.id)
            .bind(&item.purchase_id)
            .bind(&item.product_id)
            .bind(&item.batch_id)
            .bind(&item.batch_no)
            .bind(item.expiry)
            .bind(item.qty)
            .bind(item.unit_cost_paisa)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            total = total.paisa(),
            lines = request.lines.len(),
            "Purchase recorded"
        );

        AuditRepository::new(self.pool.clone())
            .record_or_log(
                request.user_id.as_deref(),
                "purchase.create",
                json!({
                    "purchase_id": purchase.id,
                    "total": total.paisa(),
                }),
            )
            .await;

        Ok(RecordPurchaseOutcome {
            purchase_id: purchase.id,
            total,
        })
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_request(request: &RecordPurchaseRequest) -> Result<(), LedgerError> {
    validate_non_empty("lines", &request.lines)?;

    for line in &request.lines {
        validate_uuid("product_id", &line.product_id)?;
        validate_batch_no(&line.batch_no)?;
        validate_quantity(line.qty)?;
        validate_price_paisa(line.unit_cost_paisa)?;
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

    fn line(product_id: &str, batch_no: &str, qty: i64, cost: i64) -> PurchaseLineRequest {
        PurchaseLineRequest {
            product_id: product_id.to_string(),
            batch_no: batch_no.to_string(),
            expiry: testutil::date("2026-01-01"),
            qty,
            unit_cost_paisa: cost,
        }
    }

    #[tokio::test]
    async fn test_purchase_creates_batch() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;

        let outcome = db
            .purchase_service()
            .record_purchase(&RecordPurchaseRequest {
                supplier: Some("HealthLink Distributors".to_string()),
                invoice_no: Some("INV-881".to_string()),
                lines: vec![line(&product_id, "BN-01", 10, 450)],
                user_id: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.total.paisa(), 4_500);

        let batches = db.batches().list_for_product(&product_id).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].qty, 10);
        assert_eq!(batches[0].cost_paisa, 450);
    }

    #[tokio::test]
    async fn test_repeat_purchase_merges_with_weighted_average() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;
        let service = db.purchase_service();

        service
            .record_purchase(&RecordPurchaseRequest {
                supplier: None,
                invoice_no: None,
                lines: vec![line(&product_id, "BN-01", 5, 1000)],
                user_id: None,
            })
            .await
            .unwrap();

        service
            .record_purchase(&RecordPurchaseRequest {
                supplier: None,
                invoice_no: None,
                lines: vec![line(&product_id, "BN-01", 5, 2000)],
                user_id: None,
            })
            .await
            .unwrap();

        let batches = db.batches().list_for_product(&product_id).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].qty, 10);
        assert_eq!(batches[0].cost_paisa, 1500);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected_before_mutation() {
        let db = testutil::test_db().await;

        let err = db
            .purchase_service()
            .record_purchase(&RecordPurchaseRequest {
                supplier: None,
                invoice_no: None,
                lines: vec![line("33333333-3333-4333-8333-333333333333", "BN-01", 5, 100)],
                user_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purchase_audit_recorded() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;

        db.purchase_service()
            .record_purchase(&RecordPurchaseRequest {
                supplier: None,
                invoice_no: None,
                lines: vec![line(&product_id, "BN-01", 5, 100)],
                user_id: None,
            })
            .await
            .unwrap();

        let entries = db.audit().list_by_action("purchase.create", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
    }
}
