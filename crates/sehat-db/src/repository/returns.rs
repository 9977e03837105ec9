//! # Return Repository
//!
//! Row operations for returns and return items. Returns only ever grow:
//! no update or delete exists here, because the reconciliation design
//! shrinks sale lines instead of touching return history.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use sehat_core::{Return, ReturnItem};

const RETURN_COLUMNS: &str = "id, sale_id, total_paisa, reason, user_id, created_at";

const RETURN_ITEM_COLUMNS: &str = "id, return_id, sale_item_id, product_id, batch_id, \
     qty, unit_price_paisa, unit_cost_paisa, created_at";

/// Repository for return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Gets a return by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Return>> {
        let ret = sqlx::query_as::<_, Return>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ret)
    }

    /// Lists the returns recorded against a sale.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Return>> {
        let returns = sqlx::query_as::<_, Return>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Gets the items of a return.
    pub async fn get_items(&self, return_id: &str) -> DbResult<Vec<ReturnItem>> {
        let items = sqlx::query_as::<_, ReturnItem>(&format!(
            "SELECT {RETURN_ITEM_COLUMNS} FROM return_items \
             WHERE return_id = ?1 ORDER BY created_at, id"
        ))
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a return header.
    pub async fn insert_return(&self, conn: &mut SqliteConnection, ret: &Return) -> DbResult<()> {
        debug!(id = %ret.id, sale_id = %ret.sale_id, total = ret.total_paisa, "Inserting return");

        sqlx::query(
            "INSERT INTO returns (id, sale_id, total_paisa, reason, user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&ret.id)
        .bind(&ret.sale_id)
        .bind(ret.total_paisa)
        .bind(&ret.reason)
        .bind(&ret.user_id)
        .bind(ret.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one returned line.
    pub async fn insert_item(
        &self,
        conn: &mut SqliteConnection,
        item: &ReturnItem,
    ) -> DbResult<()> {
        debug!(
            return_id = %item.return_id,
            sale_item_id = %item.sale_item_id,
            qty = item.qty,
            "Inserting return item"
        );

        sqlx::query(
            "INSERT INTO return_items ( \
                id, return_id, sale_item_id, product_id, batch_id, \
                qty, unit_price_paisa, unit_cost_paisa, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.return_id)
        .bind(&item.sale_item_id)
        .bind(&item.product_id)
        .bind(&item.batch_id)
        .bind(item.qty)
        .bind(item.unit_price_paisa)
        .bind(item.unit_cost_paisa)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Total quantity already returned against one sale line.
    ///
    /// Reporting uses this to reconstruct the originally sold quantity;
    /// the return ceiling itself reads the line's remaining qty, which
    /// the shrink keeps equal to original minus this sum.
    pub async fn returned_qty_for_item(
        &self,
        conn: &mut SqliteConnection,
        sale_item_id: &str,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(qty) FROM return_items WHERE sale_item_id = ?1",
        )
        .bind(sale_item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Generates a new return ID.
pub fn generate_return_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new return item ID.
pub fn generate_return_item_id() -> String {
    Uuid::new_v4().to_string()
}
