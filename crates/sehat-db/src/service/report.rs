//! # Profit Report Aggregator
//!
//! Read-only reconstruction of a date range's sales figures. No
//! transaction, no locking; the queries read whatever has committed.
//!
//! The heavy lifting is in `sehat_core::report`; this module only
//! fetches the three inputs:
//!
//! 1. Sale lines in range, each with its returned-quantity sum and the
//!    batch cost fallback
//! 2. Return lines whose **parent sale** is in range (returns are
//!    attributed to the original sale's date, so a sale and its later
//!    return always land in the same reporting period)
//! 3. The expense total for the range

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::LedgerResult;
use crate::repository::expense::ExpenseRepository;
use sehat_core::report::{summarize, ProfitReport, ReturnedLine, SoldLine};
use sehat_core::{DiscountRate, Money};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row for the sale-line query.
#[derive(Debug, sqlx::FromRow)]
struct SoldLineRow {
    sale_id: String,
    product_name: String,
    qty: i64,
    returned_qty: i64,
    unit_price_paisa: i64,
    unit_cost_paisa: i64,
    batch_cost_paisa: i64,
    discount_bps: u32,
}

impl From<SoldLineRow> for SoldLine {
    fn from(row: SoldLineRow) -> Self {
        SoldLine {
            sale_id: row.sale_id,
            product_name: row.product_name,
            qty: row.qty,
            returned_qty: row.returned_qty,
            unit_price: Money::from_paisa(row.unit_price_paisa),
            unit_cost: Money::from_paisa(row.unit_cost_paisa),
            batch_cost: Money::from_paisa(row.batch_cost_paisa),
            discount: DiscountRate::from_bps(row.discount_bps),
        }
    }
}

/// Internal row for the return-line query.
#[derive(Debug, sqlx::FromRow)]
struct ReturnedLineRow {
    qty: i64,
    unit_price_paisa: i64,
    unit_cost_paisa: i64,
}

impl From<ReturnedLineRow> for ReturnedLine {
    fn from(row: ReturnedLineRow) -> Self {
        ReturnedLine {
            qty: row.qty,
            unit_price: Money::from_paisa(row.unit_price_paisa),
            unit_cost: Money::from_paisa(row.unit_cost_paisa),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// The profit/COGS report aggregator.
#[derive(Debug, Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    /// Creates a new ReportService.
    pub fn new(pool: SqlitePool) -> Self {
        ReportService { pool }
    }

    /// Builds the profit report for [from, to], inclusive by calendar
    /// date of creation.
    pub async fn profit_report(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<ProfitReport> {
        debug!(%from, %to, "Building profit report");

        let sold_rows = sqlx::query_as::<_, SoldLineRow>(
            "SELECT \
                si.sale_id, \
                p.name AS product_name, \
                si.qty, \
                COALESCE((SELECT SUM(ri.qty) FROM return_items ri \
                          WHERE ri.sale_item_id = si.id), 0) AS returned_qty, \
                si.unit_price_paisa, \
                si.unit_cost_paisa, \
                COALESCE(b.cost_paisa, 0) AS batch_cost_paisa, \
                si.discount_bps \
             FROM sale_items si \
             JOIN sales s ON s.id = si.sale_id \
             JOIN products p ON p.id = si.product_id \
             LEFT JOIN batches b ON b.id = si.batch_id \
             WHERE date(s.created_at) BETWEEN date(?1) AND date(?2) \
             ORDER BY s.created_at, si.id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        // Filter on the PARENT SALE's date, not the return's own
        let return_rows = sqlx::query_as::<_, ReturnedLineRow>(
            "SELECT ri.qty, ri.unit_price_paisa, ri.unit_cost_paisa \
             FROM return_items ri \
             JOIN returns r ON r.id = ri.return_id \
             JOIN sales s ON s.id = r.sale_id \
             WHERE date(s.created_at) BETWEEN date(?1) AND date(?2)",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let expenses = ExpenseRepository::new(self.pool.clone())
            .total_in_range(from, to)
            .await?;

        let lines: Vec<SoldLine> = sold_rows.into_iter().map(SoldLine::from).collect();
        let returns: Vec<ReturnedLine> = return_rows.into_iter().map(ReturnedLine::from).collect();

        let report = summarize(&lines, &returns, expenses);

        debug!(
            rows = report.rows.len(),
            gross = report.summary.gross_sales.paisa(),
            net_profit = report.summary.net_profit.paisa(),
            "Profit report built"
        );

        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::returns::{CreateReturnRequest, ReturnLineRequest};
    use crate::service::sale::{CreateSaleRequest, SaleLineRequest};
    use crate::testutil;
    use chrono::{Duration, Utc};
    use sehat_core::StaffRole;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn sell(db: &crate::Database, product_id: &str, qty: i64, price: i64) -> String {
        db.sale_service()
            .create_sale(&CreateSaleRequest {
                lines: vec![SaleLineRequest {
                    product_id: product_id.to_string(),
                    qty,
                    unit_price_paisa: price,
                }],
                discount_bps: 0,
                role: StaffRole::Cashier,
                user_id: None,
            })
            .await
            .unwrap()
            .sale_id
    }

    #[tokio::test]
    async fn test_reconstruction_after_return() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 20, 6_000).await;

        // Sell 10 @ 100.00, return 4
        let sale_id = sell(&db, &product_id, 10, 10_000).await;
        let receipt = db.sale_service().get_receipt(&sale_id).await.unwrap();
        db.return_service()
            .create_return(&CreateReturnRequest {
                sale_id: sale_id.clone(),
                lines: vec![ReturnLineRequest {
                    sale_item_id: receipt.items[0].id.clone(),
                    product_id: product_id.clone(),
                    batch_id: receipt.items[0].batch_id.clone(),
                    qty: 4,
                    unit_price_paisa: 10_000,
                    discount_bps: None,
                }],
                reason: None,
                user_id: None,
            })
            .await
            .unwrap();

        let report = db.report_service().profit_report(today(), today()).await.unwrap();
        let s = &report.summary;

        // Gross reconstructed to the original 10 units
        assert_eq!(s.gross_sales.paisa(), 100_000);
        assert_eq!(s.returns.paisa(), 40_000);
        assert_eq!(s.actual_revenue.paisa(), 60_000);
        assert_eq!(s.cogs.paisa(), 60_000);
        assert_eq!(s.returns_cogs.paisa(), 24_000);
        assert_eq!(s.gross_profit.paisa(), 24_000);
        assert_eq!(s.missing_cost_lines, 0);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].original_qty, 10);
        assert_eq!(report.rows[0].returned_qty, 4);
    }

    #[tokio::test]
    async fn test_return_attributed_to_sale_date() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 20, 6_000).await;

        let sale_id = sell(&db, &product_id, 10, 10_000).await;
        let receipt = db.sale_service().get_receipt(&sale_id).await.unwrap();
        let outcome = db
            .return_service()
            .create_return(&CreateReturnRequest {
                sale_id: sale_id.clone(),
                lines: vec![ReturnLineRequest {
                    sale_item_id: receipt.items[0].id.clone(),
                    product_id: product_id.clone(),
                    batch_id: receipt.items[0].batch_id.clone(),
                    qty: 4,
                    unit_price_paisa: 10_000,
                    discount_bps: None,
                }],
                reason: None,
                user_id: None,
            })
            .await
            .unwrap();

        // Push the return itself a week into the future; the report for
        // the sale's date must still see it
        let future = Utc::now() + Duration::days(7);
        sqlx::query("UPDATE returns SET created_at = ?1 WHERE id = ?2")
            .bind(future)
            .bind(&outcome.return_id)
            .execute(db.pool())
            .await
            .unwrap();

        let report = db.report_service().profit_report(today(), today()).await.unwrap();
        assert_eq!(report.summary.returns.paisa(), 40_000);
        assert_eq!(report.summary.actual_revenue.paisa(), 60_000);
    }

    #[tokio::test]
    async fn test_discount_and_expenses_in_summary() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 20, 6_000).await;

        // 10 @ 100.00 with 10% (cashier cap, no GST)
        db.sale_service()
            .create_sale(&CreateSaleRequest {
                lines: vec![SaleLineRequest {
                    product_id: product_id.clone(),
                    qty: 10,
                    unit_price_paisa: 10_000,
                }],
                discount_bps: 1000,
                role: StaffRole::Cashier,
                user_id: None,
            })
            .await
            .unwrap();

        db.expenses()
            .insert("electricity", Money::from_paisa(5_000))
            .await
            .unwrap();

        let report = db.report_service().profit_report(today(), today()).await.unwrap();
        let s = &report.summary;

        assert_eq!(s.gross_sales.paisa(), 100_000);
        assert_eq!(s.discounts.paisa(), 10_000);
        assert_eq!(s.net_sales.paisa(), 90_000);
        assert_eq!(s.cogs.paisa(), 60_000);
        assert_eq!(s.expenses.paisa(), 5_000);
        assert_eq!(s.gross_profit.paisa(), 30_000);
        assert_eq!(s.net_profit.paisa(), 25_000);
        assert_eq!(s.net_cash.paisa(), 85_000);
    }

    #[tokio::test]
    async fn test_out_of_range_sale_excluded() {
        let db = testutil::test_db().await;
        let product_id = testutil::insert_product(&db, "Panadol", 10_000, 0).await;
        testutil::add_stock(&db, &product_id, "BN-01", None, 20, 6_000).await;
        sell(&db, &product_id, 5, 10_000).await;

        let yesterday = today() - Duration::days(1);
        let report = db
            .report_service()
            .profit_report(yesterday, yesterday)
            .await
            .unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.summary.gross_sales.paisa(), 0);
    }
}
