//! # Audit Log Repository
//!
//! Fire-and-forget audit sink.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  LEDGER OPERATION (one transaction)                                 │
//! │       │                                                             │
//! │       ▼ COMMIT                                                      │
//! │  record_or_log("sale.create", {...})                                │
//! │       │                                                             │
//! │       ├── Ok  → audit row written                                   │
//! │       └── Err → warn! and move on                                   │
//! │                                                                     │
//! │  An audit failure is NEVER allowed to fail or roll back the         │
//! │  ledger operation it describes.                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use sehat_core::AuditEntry;

const AUDIT_COLUMNS: &str = "id, user_id, action, details, created_at";

/// Repository for the audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Writes an audit record.
    ///
    /// ## Arguments
    /// * `action` - dotted event name: "sale.create", "return.create",
    ///   "purchase.create"
    /// * `details` - JSON document describing the event
    pub async fn record(
        &self,
        user_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
    ) -> DbResult<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            action: action.to_string(),
            details: details.to_string(),
            created_at: Utc::now(),
        };

        debug!(action = %action, "Writing audit record");

        sqlx::query(
            "INSERT INTO audit_log (id, user_id, action, details, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Writes an audit record, swallowing any failure.
    ///
    /// The ledger services call this after their transaction commits;
    /// callers never observe the outcome.
    pub async fn record_or_log(
        &self,
        user_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
    ) {
        if let Err(err) = self.record(user_id, action, details).await {
            warn!(action = %action, error = %err, "Audit write failed; continuing");
        }
    }

    /// Lists recent entries for an action, newest first.
    pub async fn list_by_action(&self, action: &str, limit: u32) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log \
             WHERE action = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))
        .bind(action)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
