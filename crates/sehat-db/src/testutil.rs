//! Shared helpers for the storage and service tests. Each test gets its
//! own isolated in-memory database.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{Database, DbConfig};
use sehat_core::{Money, Product};

/// Creates a fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Parses an ISO date into the Option shape the batch API takes.
pub fn date(s: &str) -> Option<NaiveDate> {
    Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date"))
}

/// Inserts an active product and returns its id.
pub async fn insert_product(db: &Database, name: &str, price_paisa: i64, gst_bps: u32) -> String {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        formula: None,
        category: Some("tablet".to_string()),
        pack_size: 10,
        mrp_paisa: price_paisa,
        selling_price_paisa: price_paisa,
        gst_bps,
        supplier: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    db.products().insert(&product).await.expect("insert product");
    product.id
}

/// Adds stock straight through the batch ledger and returns the batch id.
pub async fn add_stock(
    db: &Database,
    product_id: &str,
    batch_no: &str,
    expiry: Option<NaiveDate>,
    qty: i64,
    cost_paisa: i64,
) -> String {
    let mut tx = db.pool().begin().await.expect("begin");
    let batch = db
        .batches()
        .increase_stock(
            &mut tx,
            product_id,
            batch_no,
            expiry,
            qty,
            Money::from_paisa(cost_paisa),
        )
        .await
        .expect("increase stock");
    tx.commit().await.expect("commit");
    batch.id
}
