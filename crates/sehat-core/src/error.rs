//! # Error Types
//!
//! Domain-specific error types for sehat-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  sehat-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  sehat-db errors (separate crate)                                   │
//! │  ├── DbError          - Storage operation failures                  │
//! │  └── LedgerError      - CoreError | DbError at the service seam     │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → LedgerError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, never manual impls
//! 2. Context in every message (ids, quantities)
//! 3. Errors are enum variants, never String
//! 4. Validation fires before any ledger mutation

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations detected before or during a
/// ledger operation; each one aborts the whole operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (or is soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Batch cannot be found.
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// Sale cannot be found. Also raised by the receipt read path when
    /// every line of an invoice has been fully returned.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale line cannot be found, or does not belong to the referenced
    /// sale.
    #[error("Sale item not found: {0}")]
    SaleItemNotFound(String),

    /// FEFO exhausted the product's batches before satisfying the
    /// requested quantity. The enclosing sale rolls back entirely; no
    /// partial decrement survives.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Requested return quantity exceeds the line's remaining
    /// (un-returned) quantity.
    #[error("Return exceeds remaining for sale item {sale_item_id}: remaining {remaining}, requested {requested}")]
    ReturnExceedsRemaining {
        sale_item_id: String,
        remaining: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Rejected synchronously, with field-level detail, before the ledger is
/// touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Empty collection where at least one element is required.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 3, requested 5"
        );

        let err = CoreError::ReturnExceedsRemaining {
            sale_item_id: "si-1".to_string(),
            remaining: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Return exceeds remaining for sale item si-1: remaining 2, requested 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "batch_no".to_string(),
        };
        assert_eq!(err.to_string(), "batch_no is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "qty".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
