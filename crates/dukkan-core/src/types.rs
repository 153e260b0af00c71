//! # Domain Types
//!
//! Core domain types used throughout the Dukkan ledger engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Documents                 Ledger rows              Balance holders     │
//! │  ─────────                 ───────────              ───────────────     │
//! │  Sale / SaleItem           StockMovement            Product.stock       │
//! │  Purchase / PurchaseItem   CustomerPayment          Customer.balance    │
//! │  Expense                   AccountTransaction       Supplier.balance    │
//! │                                                     Account.balance     │
//! │                                                                         │
//! │  Every balance holder caches the fold of its ledger. The cache is      │
//! │  only ever written by the transaction that appends the ledger row.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where applicable (`product_code`, invoice number) -
//!   human-readable, potentially mutable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// The cause of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock out through a sale (negative amounts).
    Sale,
    /// Stock in through a supplier purchase (positive amounts).
    Purchase,
    /// Customer return (positive amounts).
    Return,
    /// Manual correction or initial stock load.
    Adjustment,
}

/// How a sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    CreditCard,
    /// Deferred payment - increases the customer's owed balance.
    OnAccount,
}

/// The status of a sale.
///
/// The sale processor only ever writes `Completed`; `Voided` exists so
/// history can represent a future void/refund path without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Voided,
}

/// Settlement method for a customer payment (no on-account here - a debt
/// cannot be paid with more debt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CollectionMethod {
    Cash,
    CreditCard,
}

/// Kind of a cash/bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Bank,
    Pos,
}

/// Direction of a cash-flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money flowing into the account.
    In,
    /// Money flowing out of the account.
    Out,
}

/// Which ledger a finance projection row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum FinanceSource {
    Account,
    Sale,
    Expense,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock_quantity` is a cache: it must always equal the sum of the
/// product's stock movements. Nothing outside a movement-appending
/// transaction may write it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business (tenant) this product belongs to.
    pub business_id: String,

    /// Display name shown at the register and on documents.
    pub name: String,

    /// Business identifier, unique per business.
    pub product_code: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Default supplier for restocking.
    pub supplier_id: Option<String>,

    /// Free-form category label.
    pub category: Option<String>,

    /// Cost basis in minor units (approximation, see PurchaseItem).
    pub buying_price_minor: i64,

    /// Sale price in minor units.
    pub selling_price_minor: i64,

    /// Cached stock level. May go negative under the permissive policy.
    pub stock_quantity: i64,

    /// Stock level at which the product is flagged as running low.
    pub critical_stock_level: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_minor(self.selling_price_minor)
    }

    /// Returns the buying price as a Money type.
    #[inline]
    pub fn buying_price(&self) -> Money {
        Money::from_minor(self.buying_price_minor)
    }

    /// Whether the cached stock has fallen to or below the critical level.
    #[inline]
    pub fn is_below_critical(&self) -> bool {
        self.stock_quantity <= self.critical_stock_level
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One signed quantity change applied to a product's stock.
///
/// Immutable once written. Correcting a mistake means appending an
/// opposite-signed `Adjustment` movement, never editing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub business_id: String,
    pub product_id: String,
    /// Signed quantity: positive = stock in, negative = stock out.
    pub amount: i64,
    pub kind: MovementKind,
    /// The originating document (sale/purchase id), if any.
    pub document_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub business_id: String,
    /// Required for on-account sales; optional history link otherwise.
    pub customer_id: Option<String>,
    /// Sum of `quantity × price` before line discounts.
    pub total_amount_minor: i64,
    /// Sum of line totals after discounts. This is the ledger amount.
    pub final_amount_minor: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the post-discount amount as Money.
    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_minor(self.final_amount_minor)
    }
}

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub business_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Quantity sold (always > 0; the stock movement carries the sign).
    pub quantity: i64,
    /// Unit price in minor units at time of sale (frozen).
    pub price_minor: i64,
    /// Line discount, clamped to `[0, quantity × price]` before acceptance.
    pub discount_minor: i64,
    /// `quantity × price − discount`.
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A supplier invoice. Always increases stock and the supplier balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub business_id: String,
    pub supplier_id: String,
    pub invoice_no: Option<String>,
    /// Invoice date (day precision, as printed on the document).
    pub date: NaiveDate,
    pub total_amount_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_minor(self.total_amount_minor)
    }
}

/// A line item in a purchase. No discount field; cost history lives here
/// rather than being written back onto the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub business_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub cost_price_minor: i64,
    pub total_minor: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with an on-account (veresiye) balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Cache: positive = customer owes the business, negative = credit.
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_minor(self.balance_minor)
    }
}

/// A collection against a customer's balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerPayment {
    pub id: String,
    pub business_id: String,
    pub customer_id: String,
    pub amount_minor: i64,
    pub method: CollectionMethod,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of a customer's merged statement (sales and payments interleaved,
/// newest first). Projection only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatementEntry {
    /// A sale attached to the customer (debt when on-account).
    Sale(Sale),
    /// A collection reducing the balance.
    Payment(CustomerPayment),
}

impl StatementEntry {
    /// Timestamp used for merge-ordering the statement.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StatementEntry::Sale(s) => s.created_at,
            StatementEntry::Payment(p) => p.created_at,
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier with an owed balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    /// Cache: positive = business owes the supplier.
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_minor(self.balance_minor)
    }
}

// =============================================================================
// Account
// =============================================================================

/// A cash, bank or POS account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub kind: AccountKind,
    /// Balance at account creation; the `initial` term of the invariant.
    pub opening_balance_minor: i64,
    /// Cache: opening + Σ in − Σ out. Allowed to go negative.
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_minor(self.balance_minor)
    }
}

/// A manual cash-flow entry against an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountTransaction {
    pub id: String,
    pub business_id: String,
    pub account_id: String,
    pub direction: Direction,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Effective date chosen by the operator (may differ from created_at).
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense. Feeds the finance projection and profit summary;
/// does not touch any cached balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub business_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Finance Projection
// =============================================================================

/// One row of the unified finance view: an account transaction, a completed
/// sale or an expense, normalized to a direction and an amount.
///
/// Display/reporting only - never a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FinanceEntry {
    pub id: String,
    pub business_id: String,
    pub source: FinanceSource,
    pub direction: Direction,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
}

impl FinanceEntry {
    /// The entry's amount with the direction applied as a sign.
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            Direction::In => Money::from_minor(self.amount_minor),
            Direction::Out => -Money::from_minor(self.amount_minor),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_critical() {
        let mut product = sample_product();
        product.stock_quantity = 3;
        product.critical_stock_level = 5;
        assert!(product.is_below_critical());

        product.stock_quantity = 6;
        assert!(!product.is_below_critical());
    }

    #[test]
    fn test_finance_entry_signed_amount() {
        let mut entry = FinanceEntry {
            id: "t".into(),
            business_id: "b".into(),
            source: FinanceSource::Account,
            direction: Direction::In,
            amount_minor: 500,
            description: None,
            category: None,
            date: Utc::now(),
        };
        assert_eq!(entry.signed_amount().minor(), 500);

        entry.direction = Direction::Out;
        assert_eq!(entry.signed_amount().minor(), -500);
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::OnAccount).unwrap(),
            "\"on_account\""
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::Adjustment).unwrap(),
            "\"adjustment\""
        );
        assert_eq!(serde_json::to_string(&Direction::In).unwrap(), "\"in\"");
    }

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: "p1".into(),
            business_id: "b1".into(),
            name: "COLA 330ML".into(),
            product_code: "COLA-330".into(),
            barcode: None,
            supplier_id: None,
            category: None,
            buying_price_minor: 900,
            selling_price_minor: 1500,
            stock_quantity: 0,
            critical_stock_level: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
