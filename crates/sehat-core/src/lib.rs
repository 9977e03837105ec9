//! # sehat-core: Pure Business Logic for Sehat POS
//!
//! This crate is the **heart** of the pharmacy ledger. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Sehat POS Architecture                         │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                 Request layer (out of scope)                  │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │               ★ sehat-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │  ┌────────┐ ┌────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐  │ │
//! │  │  │ money  │ │  fefo  │ │ costing │ │ discount │ │ report  │  │ │
//! │  │  └────────┘ └────────┘ └─────────┘ └──────────┘ └─────────┘  │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                 sehat-db (Storage Layer)                      │ │
//! │  │       SQLite queries, migrations, transactional services      │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Batch, Sale, Return, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`costing`] - Weighted-average cost blending
//! - [`fefo`] - First-expiry-first-out consumption planning
//! - [`discount`] - Role/GST discount-cap policy
//! - [`totals`] - Sale totals and return/repair reconciliation
//! - [`report`] - Profit/COGS reconstruction arithmetic
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are paisa (i64)
//! 4. **Explicit Errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod discount;
pub mod error;
pub mod fefo;
pub mod money;
pub mod report;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use sehat_core::Money` instead of
// `use sehat_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line in a sale, return or purchase.
///
/// Guards against fat-finger entries (1000 typed instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of requested lines in a single transaction.
pub const MAX_TRANSACTION_LINES: usize = 100;
