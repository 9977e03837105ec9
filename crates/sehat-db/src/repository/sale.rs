//! # Sale Repository
//!
//! Row operations for sales and sale items.
//!
//! ## Mutation Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  INSERT sale / sale_items   only by the sale service, in its tx     │
//! │                                                                     │
//! │  sale_items.qty             shrinks only via returns (guarded) or   │
//! │                             the repair clamp; everything else on a  │
//! │                             line is frozen at sale time             │
//! │                                                                     │
//! │  sales totals               rewritten only by update_totals, fed    │
//! │                             from the shared recomputation           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sehat_core::totals::SaleTotals;
use sehat_core::{Sale, SaleItem};

const SALE_COLUMNS: &str =
    "id, total_paisa, discount_paisa, net_total_paisa, user_id, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, batch_id, qty, \
     unit_price_paisa, unit_cost_paisa, discount_bps, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID (pool read).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale =
            sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(sale)
    }

    /// Gets a sale by ID on the transaction connection.
    pub async fn get_in_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale =
            sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(sale)
    }

    /// Inserts a sale header.
    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, total = sale.total_paisa, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales ( \
                id, total_paisa, discount_paisa, net_total_paisa, user_id, \
                created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&sale.id)
        .bind(sale.total_paisa)
        .bind(sale.discount_paisa)
        .bind(sale.net_total_paisa)
        .bind(&sale.user_id)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line.
    pub async fn insert_item(&self, conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        debug!(
            sale_id = %item.sale_id,
            batch_id = %item.batch_id,
            qty = item.qty,
            "Inserting sale item"
        );

        sqlx::query(
            "INSERT INTO sale_items ( \
                id, sale_id, product_id, batch_id, qty, \
                unit_price_paisa, unit_cost_paisa, discount_bps, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.batch_id)
        .bind(item.qty)
        .bind(item.unit_price_paisa)
        .bind(item.unit_cost_paisa)
        .bind(item.discount_bps)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets one sale line by ID.
    pub async fn get_item(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<SaleItem>> {
        let item = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Gets all lines of a sale, including fully-returned (qty = 0)
    /// ones. The totals recomputation needs the complete set.
    pub async fn get_items(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Gets the receipt view of a sale's lines: remaining quantity only.
    ///
    /// An invoice whose every line has been fully returned comes back
    /// empty here - the read path treats that as not found even though
    /// the rows survive for reports.
    pub async fn receipt_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 AND qty > 0 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Shrinks a line's remaining quantity after a return.
    ///
    /// Guarded by `qty >= by`; `false` means the line raced below the
    /// requested shrink and the return must abort.
    pub async fn shrink_item_qty(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
        by: i64,
    ) -> DbResult<bool> {
        debug!(item_id = %item_id, by, "Shrinking sale item qty");

        let result = sqlx::query("UPDATE sale_items SET qty = qty - ?2 WHERE id = ?1 AND qty >= ?2")
            .bind(item_id)
            .bind(by)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rewrites a sale's totals from a recomputation result.
    pub async fn update_totals(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        totals: &SaleTotals,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET \
                total_paisa = ?2, discount_paisa = ?3, net_total_paisa = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(sale_id)
        .bind(totals.total.paisa())
        .bind(totals.discount.paisa())
        .bind(totals.net_total.paisa())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    /// Sale ids having lines with corrupted (negative or NULL)
    /// quantities; input to the repair pass.
    pub async fn corrupted_sale_ids(&self, conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT sale_id FROM sale_items WHERE qty < 0 OR qty IS NULL",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// Clamps corrupted line quantities to zero; returns how many lines
    /// were touched.
    pub async fn clamp_corrupted_items(&self, conn: &mut SqliteConnection) -> DbResult<u64> {
        let result = sqlx::query("UPDATE sale_items SET qty = 0 WHERE qty < 0 OR qty IS NULL")
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
