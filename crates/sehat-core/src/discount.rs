//! # Discount Policy
//!
//! The role/GST discount-cap table applied at sale time.
//!
//! ## The Cap Table
//! ```text
//! ┌──────────────┬──────────────┬──────────────┐
//! │  role        │  no GST      │  GST present │
//! ├──────────────┼──────────────┼──────────────┤
//! │  admin       │  12%         │  7%          │
//! │  any other   │  10%         │  5%          │
//! └──────────────┴──────────────┴──────────────┘
//! ```
//!
//! The cap silently clamps the requested discount, it never rejects: a
//! cashier asking for 50% on a GST-bearing invoice gets exactly 5%.
//! The clamped rate is stamped on every line of the sale.

use crate::types::{DiscountRate, StaffRole};

// =============================================================================
// Cap Constants
// =============================================================================

/// Admin ceiling on GST-free invoices.
pub const ADMIN_CAP_BPS: u32 = 1200;

/// Admin ceiling when any line carries GST.
pub const ADMIN_GST_CAP_BPS: u32 = 700;

/// Non-admin ceiling on GST-free invoices.
pub const STAFF_CAP_BPS: u32 = 1000;

/// Non-admin ceiling when any line carries GST.
pub const STAFF_GST_CAP_BPS: u32 = 500;

// =============================================================================
// Policy
// =============================================================================

/// Looks up the discount ceiling for a role and GST presence.
pub fn discount_cap(role: StaffRole, has_gst: bool) -> DiscountRate {
    let bps = match (role.is_admin(), has_gst) {
        (true, false) => ADMIN_CAP_BPS,
        (true, true) => ADMIN_GST_CAP_BPS,
        (false, false) => STAFF_CAP_BPS,
        (false, true) => STAFF_GST_CAP_BPS,
    };
    DiscountRate::from_bps(bps)
}

/// Clamps a requested discount to the policy ceiling.
///
/// ## Example
/// ```rust
/// use sehat_core::discount::apply_discount_policy;
/// use sehat_core::types::{DiscountRate, StaffRole};
///
/// // Cashier asks for 50% on a GST invoice: clamped to 5%, not rejected
/// let applied =
///     apply_discount_policy(DiscountRate::from_bps(5000), StaffRole::Cashier, true);
/// assert_eq!(applied.bps(), 500);
/// ```
pub fn apply_discount_policy(
    requested: DiscountRate,
    role: StaffRole,
    has_gst: bool,
) -> DiscountRate {
    requested.capped_at(discount_cap(role, has_gst))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_table() {
        assert_eq!(discount_cap(StaffRole::Admin, false).bps(), 1200);
        assert_eq!(discount_cap(StaffRole::Admin, true).bps(), 700);
        assert_eq!(discount_cap(StaffRole::Cashier, false).bps(), 1000);
        assert_eq!(discount_cap(StaffRole::Cashier, true).bps(), 500);
        assert_eq!(discount_cap(StaffRole::Pharmacist, true).bps(), 500);
    }

    #[test]
    fn test_clamp_never_rejects() {
        // 50% requested by a cashier on a GST line → exactly 5%
        let applied =
            apply_discount_policy(DiscountRate::from_bps(5000), StaffRole::Cashier, true);
        assert_eq!(applied.bps(), 500);
    }

    #[test]
    fn test_request_below_cap_passes_through() {
        let applied =
            apply_discount_policy(DiscountRate::from_bps(300), StaffRole::Admin, false);
        assert_eq!(applied.bps(), 300);
    }

    #[test]
    fn test_request_equal_to_cap() {
        let applied =
            apply_discount_policy(DiscountRate::from_bps(700), StaffRole::Admin, true);
        assert_eq!(applied.bps(), 700);
    }

    #[test]
    fn test_zero_request_stays_zero() {
        let applied = apply_discount_policy(DiscountRate::zero(), StaffRole::Admin, false);
        assert_eq!(applied.bps(), 0);
    }
}
