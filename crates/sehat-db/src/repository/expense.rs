//! # Expense Repository
//!
//! Independent expense ledger lines. Not linked to inventory; the
//! profit report subtracts the range total from gross profit and cash.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use sehat_core::{Expense, Money};

const EXPENSE_COLUMNS: &str = "id, description, amount_paisa, created_at";

/// Repository for expense operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    pub async fn insert(&self, description: &str, amount: Money) -> DbResult<Expense> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount_paisa: amount.paisa(),
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, amount = expense.amount_paisa, "Recording expense");

        sqlx::query(
            "INSERT INTO expenses (id, description, amount_paisa, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(expense.amount_paisa)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists expenses with created_at inside [from, to] by calendar date.
    pub async fn list_in_range(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE date(created_at) BETWEEN date(?1) AND date(?2) \
             ORDER BY created_at, id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sum of expenses inside [from, to] by calendar date.
    pub async fn total_in_range(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_paisa) FROM expenses \
             WHERE date(created_at) BETWEEN date(?1) AND date(?2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_paisa(total.unwrap_or(0)))
    }
}
