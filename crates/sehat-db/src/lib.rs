//! # sehat-db: Database Layer for Sehat POS
//!
//! Storage for the pharmacy ledger: SQLite via sqlx with embedded
//! migrations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Sehat POS Data Flow                           │
//! │                                                                     │
//! │  Request layer (out of scope)                                       │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                   sehat-db (THIS CRATE)                       │ │
//! │  │                                                               │ │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌─────────────────────┐ │ │
//! │  │  │  Database  │   │ Repositories │   │  Ledger Services    │ │ │
//! │  │  │ (pool.rs)  │◄──│ product      │◄──│  sale (FEFO)        │ │ │
//! │  │  │            │   │ batch        │   │  returns / repair   │ │ │
//! │  │  │ SqlitePool │   │ sale         │   │  purchase           │ │ │
//! │  │  │ WAL + FK   │   │ returns ...  │   │  report (read-only) │ │ │
//! │  │  └────────────┘   └──────────────┘   └─────────────────────┘ │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (or :memory: in tests)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - DbError and the LedgerError service union
//! - [`repository`] - Row mappers per aggregate
//! - [`service`] - Transaction-scoped ledger operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sehat_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/sehat.db")).await?;
//!
//! let outcome = db.sale_service().create_sale(&request).await?;
//! let report = db.report_service().profit_report(from, to).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditRepository;
pub use repository::batch::BatchRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::product::ProductRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;

// Service re-exports
pub use service::purchase::PurchaseService;
pub use service::report::ReportService;
pub use service::returns::ReturnService;
pub use service::sale::SaleService;
