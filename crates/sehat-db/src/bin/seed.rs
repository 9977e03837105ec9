//! # Seed Data Generator
//!
//! Populates a database with demo pharmacy data for development:
//! a small catalog, purchases that stock the batch ledger (several
//! batches per product with staggered expiries), one discounted sale
//! and a partial return, so every screen has something to show.
//!
//! ## Usage
//! ```bash
//! # Default database path (./sehat.db)
//! cargo run -p sehat-db --bin seed
//!
//! # Custom path
//! cargo run -p sehat-db --bin seed -- --db ./data/sehat.db
//! ```

use std::env;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use sehat_core::{Money, Product, StaffRole};
use sehat_db::service::purchase::{PurchaseLineRequest, RecordPurchaseRequest};
use sehat_db::service::returns::{CreateReturnRequest, ReturnLineRequest};
use sehat_db::service::sale::{CreateSaleRequest, SaleLineRequest};
use sehat_db::{Database, DbConfig};

/// (name, formula, category, pack_size, selling price paisa, gst bps)
const CATALOG: &[(&str, &str, &str, i64, i64, u32)] = &[
    ("Panadol 500mg", "Paracetamol", "tablet", 200, 350, 0),
    ("Brufen 400mg", "Ibuprofen", "tablet", 100, 650, 0),
    ("Augmentin 625mg", "Co-amoxiclav", "tablet", 6, 5600, 1700),
    ("Calpol Syrup 120ml", "Paracetamol", "syrup", 1, 9800, 1700),
    ("Flagyl 400mg", "Metronidazole", "tablet", 100, 420, 0),
    ("Risek 20mg", "Omeprazole", "capsule", 14, 1650, 0),
    ("Ventolin Inhaler", "Salbutamol", "inhaler", 1, 38500, 1700),
    ("Disprin", "Aspirin", "tablet", 100, 250, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./sehat.db".to_string());
    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let product_ids = seed_catalog(&db).await?;
    seed_stock(&db, &product_ids).await?;
    seed_transactions(&db, &product_ids).await?;

    info!("Seed complete");
    Ok(())
}

/// Reads `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn seed_catalog(db: &Database) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let products = db.products();
    let now = Utc::now();
    let mut ids = Vec::with_capacity(CATALOG.len());

    for (name, formula, category, pack_size, price, gst_bps) in CATALOG {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            formula: Some((*formula).to_string()),
            category: Some((*category).to_string()),
            pack_size: *pack_size,
            mrp_paisa: *price,
            selling_price_paisa: *price,
            gst_bps: *gst_bps,
            supplier: Some("HealthLink Distributors".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        products.insert(&product).await?;
        ids.push(product.id);
    }

    info!(count = ids.len(), "Catalog seeded");
    Ok(ids)
}

/// Two staggered-expiry batches per product, so FEFO has real choices.
async fn seed_stock(db: &Database, product_ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let purchases = db.purchase_service();
    let today = Utc::now().date_naive();

    for (i, product_id) in product_ids.iter().enumerate() {
        let near = today + Duration::days(90 + (i as i64 * 17) % 120);
        let far = today + Duration::days(365 + (i as i64 * 31) % 200);
        // Cost roughly 60% of the selling price
        let cost = CATALOG[i].4 * 6 / 10;

        purchases
            .record_purchase(&RecordPurchaseRequest {
                supplier: Some("HealthLink Distributors".to_string()),
                invoice_no: Some(format!("INV-{:04}", 100 + i)),
                lines: vec![
                    PurchaseLineRequest {
                        product_id: product_id.clone(),
                        batch_no: format!("BN-{:03}A", i + 1),
                        expiry: Some(near),
                        qty: 60,
                        unit_cost_paisa: cost,
                    },
                    PurchaseLineRequest {
                        product_id: product_id.clone(),
                        batch_no: format!("BN-{:03}B", i + 1),
                        expiry: Some(far),
                        qty: 120,
                        unit_cost_paisa: cost + cost / 10,
                    },
                ],
                user_id: None,
            })
            .await?;
    }

    info!("Stock seeded");
    Ok(())
}

/// One discounted sale and a partial return against it.
async fn seed_transactions(
    db: &Database,
    product_ids: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let sale = db
        .sale_service()
        .create_sale(&CreateSaleRequest {
            lines: vec![
                SaleLineRequest {
                    product_id: product_ids[0].clone(),
                    qty: 20,
                    unit_price_paisa: CATALOG[0].4,
                },
                SaleLineRequest {
                    product_id: product_ids[2].clone(),
                    qty: 6,
                    unit_price_paisa: CATALOG[2].4,
                },
            ],
            discount_bps: 500,
            role: StaffRole::Pharmacist,
            user_id: None,
        })
        .await?;

    info!(
        sale_id = %sale.sale_id,
        net = %sale.totals.net_total,
        "Demo sale created"
    );

    let receipt = db.sale_service().get_receipt(&sale.sale_id).await?;
    let first = &receipt.items[0];
    let ret = db
        .return_service()
        .create_return(&CreateReturnRequest {
            sale_id: sale.sale_id.clone(),
            lines: vec![ReturnLineRequest {
                sale_item_id: first.id.clone(),
                product_id: first.product_id.clone(),
                batch_id: first.batch_id.clone(),
                qty: 5,
                unit_price_paisa: first.unit_price_paisa,
                discount_bps: None,
            }],
            reason: Some("customer changed mind".to_string()),
            user_id: None,
        })
        .await?;

    info!(return_id = %ret.return_id, total = %ret.total, "Demo return created");

    db.expenses()
        .insert("electricity bill", Money::from_rupees(4_500))
        .await?;

    Ok(())
}
