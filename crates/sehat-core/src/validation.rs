//! # Validation Module
//!
//! Input validation for ledger operations.
//!
//! Every mutating service validates its whole request through these
//! helpers before touching the store, so a malformed line can never
//! leave a partial decrement behind.
//!
//! ## Usage
//! ```rust
//! use sehat_core::validation::{validate_quantity, validate_price_paisa};
//!
//! validate_quantity(5).unwrap();
//! validate_price_paisa(1099).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale/return/purchase line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in paisa.
///
/// Zero is allowed (free items, missing historic costs); negative never.
pub fn validate_price_paisa(paisa: i64) -> ValidationResult<()> {
    if paisa < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount or GST rate in basis points (0% to 100%).
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a manufacturer batch number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphens, underscores, slashes
pub fn validate_batch_no(batch_no: &str) -> ValidationResult<()> {
    let batch_no = batch_no.trim();

    if batch_no.is_empty() {
        return Err(ValidationError::Required {
            field: "batch_no".to_string(),
        });
    }

    if batch_no.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "batch_no".to_string(),
            max: 50,
        });
    }

    if !batch_no
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_no".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores and slashes"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Requires at least one line in a multi-line request.
pub fn validate_non_empty<T>(field: &str, items: &[T]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_paisa() {
        assert!(validate_price_paisa(0).is_ok());
        assert!(validate_price_paisa(1099).is_ok());
        assert!(validate_price_paisa(-100).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(1700).is_ok());
        assert!(validate_rate_bps(10000).is_ok());
        assert!(validate_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_batch_no() {
        assert!(validate_batch_no("BN-2024/07").is_ok());
        assert!(validate_batch_no("ABC123").is_ok());

        assert!(validate_batch_no("").is_err());
        assert!(validate_batch_no("   ").is_err());
        assert!(validate_batch_no("has space").is_err());
        assert!(validate_batch_no(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("product_id", "").is_err());
        assert!(validate_uuid("product_id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("items", &[1, 2]).is_ok());
        let empty: [i32; 0] = [];
        assert!(validate_non_empty("items", &empty).is_err());
    }
}
