//! # Batch Ledger Repository
//!
//! The authoritative record of on-hand quantity and cost basis per
//! (product, batch). Three mutations exist:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  increase_stock   purchase intake; merges into an existing          │
//! │                   (product, batch_no) with weighted-average cost,   │
//! │                   or inserts a new batch row                        │
//! │                                                                     │
//! │  decrease_stock   sale consumption; conditional update guarded by   │
//! │                   `qty >= taken` so two racing sales can never      │
//! │                   over-draw a batch                                 │
//! │                                                                     │
//! │  restore_stock    return; unguarded increment back onto the exact   │
//! │                   originating batch                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations take `&mut SqliteConnection`: they only ever run inside a
//! service transaction, never loose against the pool.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sehat_core::costing::weighted_average_cost;
use sehat_core::{Batch, Money};

const BATCH_COLUMNS: &str =
    "id, product_id, batch_no, expiry, qty, cost_paisa, created_at, updated_at";

/// Repository for batch ledger operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists all batches for a product (any quantity), FEFO order.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches \
             WHERE product_id = ?1 \
             ORDER BY expiry IS NULL, expiry, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Fetches a product's live batches in FEFO consumption order:
    /// expiry ascending, NULL expiry last, id as the tie-break.
    ///
    /// Runs on the transaction connection so the plan is built against
    /// the same snapshot the decrements will hit.
    pub async fn live_batches_fefo(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches \
             WHERE product_id = ?1 AND qty > 0 \
             ORDER BY expiry IS NULL, expiry, id"
        ))
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(batches)
    }

    /// Finds a batch by its business key (product_id, batch_no).
    pub async fn find_by_batch_no(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        batch_no: &str,
    ) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches \
             WHERE product_id = ?1 AND batch_no = ?2"
        ))
        .bind(product_id)
        .bind(batch_no)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(batch)
    }

    /// Adds purchased stock to the ledger.
    ///
    /// Merges into the existing (product, batch_no) row with
    /// weighted-average costing, or inserts a new batch with
    /// qty = added_qty and cost = unit_cost. Returns the row as it
    /// stands after the mutation.
    pub async fn increase_stock(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        batch_no: &str,
        expiry: Option<NaiveDate>,
        added_qty: i64,
        unit_cost: Money,
    ) -> DbResult<Batch> {
        let now = Utc::now();

        if let Some(existing) = self.find_by_batch_no(conn, product_id, batch_no).await? {
            let blended = weighted_average_cost(existing.qty, existing.cost(), added_qty, unit_cost);

            debug!(
                batch_id = %existing.id,
                added_qty,
                old_cost = existing.cost_paisa,
                new_cost = blended.paisa(),
                "Merging stock into existing batch"
            );

            sqlx::query(
                "UPDATE batches SET qty = qty + ?2, cost_paisa = ?3, updated_at = ?4 \
                 WHERE id = ?1",
            )
            .bind(&existing.id)
            .bind(added_qty)
            .bind(blended.paisa())
            .bind(now)
            .execute(&mut *conn)
            .await?;

            return Ok(Batch {
                qty: existing.qty + added_qty,
                cost_paisa: blended.paisa(),
                updated_at: now,
                ..existing
            });
        }

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            batch_no: batch_no.to_string(),
            expiry,
            qty: added_qty,
            cost_paisa: unit_cost.paisa(),
            created_at: now,
            updated_at: now,
        };

        debug!(batch_id = %batch.id, batch_no = %batch_no, added_qty, "Creating batch");

        sqlx::query(
            "INSERT INTO batches ( \
                id, product_id, batch_no, expiry, qty, cost_paisa, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&batch.id)
        .bind(&batch.product_id)
        .bind(&batch.batch_no)
        .bind(batch.expiry)
        .bind(batch.qty)
        .bind(batch.cost_paisa)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(batch)
    }

    /// Decrements a batch's quantity for a sale consumption.
    ///
    /// The update is conditional on `qty >= taken`; returns `true` when
    /// the guard won. `false` means the stock moved underneath the plan
    /// (or the batch vanished) - the caller re-plans or aborts, and the
    /// enclosing transaction rolls the partial work back.
    pub async fn decrease_stock(
        &self,
        conn: &mut SqliteConnection,
        batch_id: &str,
        qty: i64,
    ) -> DbResult<bool> {
        debug!(batch_id = %batch_id, qty, "Decrementing batch stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE batches SET qty = qty - ?2, updated_at = ?3 \
             WHERE id = ?1 AND qty >= ?2",
        )
        .bind(batch_id)
        .bind(qty)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restores returned quantity onto the exact originating batch.
    ///
    /// The increment itself is uncapped; the return flow's
    /// remaining-quantity ceiling is what bounds cumulative restoration
    /// at the originally sold quantity.
    pub async fn restore_stock(
        &self,
        conn: &mut SqliteConnection,
        batch_id: &str,
        qty: i64,
    ) -> DbResult<()> {
        debug!(batch_id = %batch_id, qty, "Restoring batch stock");

        let now = Utc::now();

        let result = sqlx::query("UPDATE batches SET qty = qty + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(batch_id)
            .bind(qty)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", batch_id));
        }

        Ok(())
    }

    /// Total live quantity across a product's batches (for error detail).
    pub async fn available_qty(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(qty) FROM batches WHERE product_id = ?1 AND qty > 0",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new batch ID.
pub fn generate_batch_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_increase_stock_creates_then_merges() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;
        let repo = db.batches();

        let mut tx = db.pool().begin().await.unwrap();

        // First purchase creates the batch
        let created = repo
            .increase_stock(&mut tx, &product_id, "BN-01", None, 5, Money::from_paisa(1000))
            .await
            .unwrap();
        assert_eq!(created.qty, 5);
        assert_eq!(created.cost_paisa, 1000);

        // Second purchase merges with weighted-average costing
        let merged = repo
            .increase_stock(&mut tx, &product_id, "BN-01", None, 5, Money::from_paisa(2000))
            .await
            .unwrap();
        assert_eq!(merged.id, created.id);
        assert_eq!(merged.qty, 10);
        assert_eq!(merged.cost_paisa, 1500);

        tx.commit().await.unwrap();

        let stored = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.qty, 10);
        assert_eq!(stored.cost_paisa, 1500);
    }

    #[tokio::test]
    async fn test_decrease_stock_guard() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;
        let repo = db.batches();

        let mut tx = db.pool().begin().await.unwrap();
        let batch = repo
            .increase_stock(&mut tx, &product_id, "BN-01", None, 3, Money::from_paisa(500))
            .await
            .unwrap();

        assert!(repo.decrease_stock(&mut tx, &batch.id, 2).await.unwrap());
        // Only 1 left; taking 2 loses the guard and changes nothing
        assert!(!repo.decrease_stock(&mut tx, &batch.id, 2).await.unwrap());
        assert!(repo.decrease_stock(&mut tx, &batch.id, 1).await.unwrap());
        tx.commit().await.unwrap();

        let stored = repo.get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(stored.qty, 0);
    }

    #[tokio::test]
    async fn test_restore_stock() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;
        let repo = db.batches();

        let mut tx = db.pool().begin().await.unwrap();
        let batch = repo
            .increase_stock(&mut tx, &product_id, "BN-01", None, 3, Money::from_paisa(500))
            .await
            .unwrap();
        repo.decrease_stock(&mut tx, &batch.id, 3).await.unwrap();
        repo.restore_stock(&mut tx, &batch.id, 2).await.unwrap();
        tx.commit().await.unwrap();

        let stored = repo.get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(stored.qty, 2);

        // Unknown batch is an error
        let mut tx = db.pool().begin().await.unwrap();
        let err = repo.restore_stock(&mut tx, "missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_live_batches_fefo_order() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 1000, 0).await;
        let repo = db.batches();

        let mut tx = db.pool().begin().await.unwrap();
        repo.increase_stock(
            &mut tx,
            &product_id,
            "LATE",
            testutil::date("2025-01-01"),
            5,
            Money::from_paisa(100),
        )
        .await
        .unwrap();
        repo.increase_stock(&mut tx, &product_id, "NOEXP", None, 5, Money::from_paisa(100))
            .await
            .unwrap();
        repo.increase_stock(
            &mut tx,
            &product_id,
            "SOON",
            testutil::date("2024-06-01"),
            5,
            Money::from_paisa(100),
        )
        .await
        .unwrap();

        let live = repo.live_batches_fefo(&mut tx, &product_id).await.unwrap();
        tx.commit().await.unwrap();

        let batch_nos: Vec<&str> = live.iter().map(|b| b.batch_no.as_str()).collect();
        assert_eq!(batch_nos, vec!["SOON", "LATE", "NOEXP"]);
    }
}
