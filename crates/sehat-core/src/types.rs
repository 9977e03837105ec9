//! # Domain Types
//!
//! Core domain types for the pharmacy ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  Product ──< Batch            the batch ledger (qty + avg cost)     │
//! │                                                                     │
//! │  Sale ──< SaleItem >── Batch  one line per batch FEFO consumed      │
//! │                                                                     │
//! │  Return ──< ReturnItem >── SaleItem   undo, batch-exact             │
//! │                                                                     │
//! │  Purchase ──< PurchaseItem    stock intake, feeds the batch ledger  │
//! │                                                                     │
//! │  Expense, AuditEntry          report input / fire-and-forget sink   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frozen-Field Pattern
//! Sale and return lines snapshot price, cost and discount at the moment
//! of the transaction. Later catalog or batch changes never rewrite
//! history; reporting reconstructs "as originally sold" from these
//! snapshots plus the return rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Rates (basis points)
// =============================================================================

/// GST rate in basis points (bps). 1 bps = 0.01%; 1700 = 17%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstRate(u32);

impl GstRate {
    /// Creates a GST rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero GST.
    #[inline]
    pub const fn zero() -> Self {
        GstRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate::zero()
    }
}

/// Discount rate in basis points. 500 = 5%.
///
/// Caps and stamped line discounts both use this type; the clamp in
/// [`crate::discount`] guarantees a stamped rate never exceeds its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// The smaller of this rate and `cap`.
    #[inline]
    pub fn capped_at(self, cap: DiscountRate) -> DiscountRate {
        if self.0 > cap.0 {
            cap
        } else {
            self
        }
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Staff Role
// =============================================================================

/// Role of the staff member performing an operation.
///
/// Only the admin/non-admin split matters to the discount policy; the
/// finer roles exist because the request layer authenticates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Pharmacist,
    Cashier,
}

impl StaffRole {
    /// Checks whether this role gets the admin discount ceiling.
    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, StaffRole::Admin)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A medicine (or other item) in the catalog.
///
/// `selling_price_paisa` is always per indivisible unit; `pack_size` is
/// purchase-side accounting only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on receipts.
    pub name: String,

    /// Active ingredient / formula.
    pub formula: Option<String>,

    /// Category (tablet, syrup, injection, ...).
    pub category: Option<String>,

    /// Units per pack (purchase-side only).
    pub pack_size: i64,

    /// Maximum retail price per unit, in paisa.
    pub mrp_paisa: i64,

    /// Selling price per unit, in paisa.
    pub selling_price_paisa: i64,

    /// GST rate in basis points (1700 = 17%).
    pub gst_bps: u32,

    /// Supplier reference (free text).
    pub supplier: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_paisa(self.selling_price_paisa)
    }

    /// Returns the MRP as Money.
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_paisa(self.mrp_paisa)
    }

    /// Returns the GST rate.
    #[inline]
    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_bps)
    }

    /// Checks whether this product carries GST.
    #[inline]
    pub fn has_gst(&self) -> bool {
        self.gst_bps > 0
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A distinct receipt of a product in the batch ledger.
///
/// `qty` is live on-hand stock (never negative); `cost_paisa` is the
/// weighted-average unit cost, re-blended on every purchase into the
/// same (product, batch_no).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Batch {
    pub id: String,
    pub product_id: String,

    /// Manufacturer batch number; unique per product.
    pub batch_no: String,

    /// Expiry date. `None` sorts last in FEFO order (treated as
    /// infinitely far in the future).
    pub expiry: Option<NaiveDate>,

    /// On-hand quantity.
    pub qty: i64,

    /// Weighted-average unit cost in paisa.
    pub cost_paisa: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_paisa(self.cost_paisa)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header.
///
/// Totals are the only fields mutated after creation, and only by the
/// return/repair reconciliation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Sum of line extensions before discount, in paisa.
    pub total_paisa: i64,

    /// Absolute discount, 0 <= discount <= total.
    pub discount_paisa: i64,

    /// total - discount.
    pub net_total_paisa: i64,

    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.total_paisa)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_paisa(self.discount_paisa)
    }

    #[inline]
    pub fn net_total(&self) -> Money {
        Money::from_paisa(self.net_total_paisa)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// One batch-level line of a sale.
///
/// A single requested product line becomes several SaleItems when FEFO
/// split it across batches. `qty` is the remaining un-returned quantity;
/// the originally sold quantity is `qty + Σ(linked ReturnItem.qty)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub batch_id: String,

    /// Remaining un-returned quantity. Decreases only via returns.
    pub qty: i64,

    /// Unit price at sale time (frozen).
    pub unit_price_paisa: i64,

    /// Batch cost at the moment of consumption (frozen).
    pub unit_cost_paisa: i64,

    /// Sale-level discount stamped on every line (frozen).
    pub discount_bps: u32,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }

    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_paisa(self.unit_cost_paisa)
    }

    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }

    /// The flat, undiscounted extension of the remaining quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.qty)
    }
}

// =============================================================================
// Return
// =============================================================================

/// A return header against one sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Return {
    pub id: String,
    pub sale_id: String,

    /// Sum of refund extensions (qty × refund unit price), in paisa.
    pub total_paisa: i64,

    pub reason: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Return {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.total_paisa)
    }
}

/// One returned line, referencing the originating sale line and batch.
///
/// `unit_price_paisa` is the effective, discount-adjusted refund price;
/// `unit_cost_paisa` is copied from the SaleItem for profit
/// reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnItem {
    pub id: String,
    pub return_id: String,
    pub sale_item_id: String,
    pub product_id: String,
    pub batch_id: String,

    /// Returned quantity, always > 0.
    pub qty: i64,

    pub unit_price_paisa: i64,
    pub unit_cost_paisa: i64,
    pub created_at: DateTime<Utc>,
}

impl ReturnItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }

    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_paisa(self.unit_cost_paisa)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A stock intake header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub supplier: Option<String>,
    pub invoice_no: Option<String>,
    pub total_paisa: i64,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One received line; feeds the batch ledger through the
/// weighted-average merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub batch_id: String,
    pub batch_no: String,
    pub expiry: Option<NaiveDate>,
    pub qty: i64,
    pub unit_cost_paisa: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// An independent expense ledger line; report input only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_paisa: i64,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paisa(self.amount_paisa)
    }
}

// =============================================================================
// Audit
// =============================================================================

/// A fire-and-forget audit record. Failures writing these are logged
/// and swallowed; they never block a ledger operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    /// JSON document describing the event.
    pub details: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
