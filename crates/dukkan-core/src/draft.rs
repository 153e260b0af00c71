//! # Draft Documents
//!
//! Non-durable sale and purchase drafts. A draft is the cart a caller builds
//! up before asking a processor to commit it; it never touches storage, so an
//! abandoned draft leaves no trace.
//!
//! ## Discount Clamping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Requested discounts are never trusted:                                 │
//! │                                                                         │
//! │  raw_total  = quantity × price                                         │
//! │  discount   = requested.clamp(0, raw_total)                            │
//! │  line_total = raw_total − discount        (never negative)             │
//! │                                                                         │
//! │  price 100.00 × qty 3, requested discount 400.00                       │
//! │      → discount 300.00, line total 0.00                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::PaymentMethod;

// =============================================================================
// Sale Draft
// =============================================================================

/// One line of a sale draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    /// Units sold. Must be > 0; validated before commit.
    pub quantity: i64,
    /// Unit price at the register (usually the product's selling price,
    /// but the operator may override it).
    pub price: Money,
    /// Requested line discount. Clamped on read, so a stored draft can
    /// never produce a negative line.
    pub discount: Money,
}

impl SaleLine {
    /// Creates a line with no discount.
    pub fn new(product_id: impl Into<String>, quantity: i64, price: Money) -> Self {
        SaleLine {
            product_id: product_id.into(),
            quantity,
            price,
            discount: Money::zero(),
        }
    }

    /// Sets the requested discount (builder style).
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// `quantity × price` before any discount.
    #[inline]
    pub fn raw_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    /// The discount actually applied: requested, clamped to
    /// `[0, quantity × price]`.
    #[inline]
    pub fn effective_discount(&self) -> Money {
        self.discount.clamp(Money::zero(), self.raw_total())
    }

    /// `quantity × price − effective_discount`. Never negative.
    #[inline]
    pub fn total(&self) -> Money {
        self.raw_total() - self.effective_discount()
    }
}

/// A sale ready to be committed: the cart plus settlement choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    /// Required when `payment_method` is `OnAccount`; otherwise an optional
    /// history link.
    pub customer_id: Option<String>,
}

impl SaleDraft {
    pub fn new(payment_method: PaymentMethod) -> Self {
        SaleDraft {
            lines: Vec::new(),
            payment_method,
            customer_id: None,
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn add_line(mut self, line: SaleLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sum of raw line totals, before discounts.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(SaleLine::raw_total).sum()
    }

    /// Sum of discounted line totals. This is what the sale settles for.
    pub fn final_amount(&self) -> Money {
        self.lines.iter().map(SaleLine::total).sum()
    }
}

// =============================================================================
// Purchase Draft
// =============================================================================

/// One line of a purchase draft. No discount field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit cost from the supplier invoice.
    pub cost_price: Money,
}

impl PurchaseLine {
    pub fn new(product_id: impl Into<String>, quantity: i64, cost_price: Money) -> Self {
        PurchaseLine {
            product_id: product_id.into(),
            quantity,
            cost_price,
        }
    }

    /// `quantity × cost_price`.
    #[inline]
    pub fn total(&self) -> Money {
        self.cost_price.multiply_quantity(self.quantity)
    }
}

/// A supplier invoice ready to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDraft {
    pub supplier_id: String,
    pub invoice_no: Option<String>,
    pub date: chrono::NaiveDate,
    pub lines: Vec<PurchaseLine>,
}

impl PurchaseDraft {
    pub fn new(supplier_id: impl Into<String>, date: chrono::NaiveDate) -> Self {
        PurchaseDraft {
            supplier_id: supplier_id.into(),
            invoice_no: None,
            date,
            lines: Vec::new(),
        }
    }

    pub fn with_invoice_no(mut self, invoice_no: impl Into<String>) -> Self {
        self.invoice_no = Some(invoice_no.into());
        self
    }

    pub fn add_line(mut self, line: PurchaseLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sum of line totals - what gets appended to the supplier's balance.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(PurchaseLine::total).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_without_discount() {
        let line = SaleLine::new("p1", 3, Money::from_minor(5000));
        assert_eq!(line.raw_total().minor(), 15_000);
        assert_eq!(line.total().minor(), 15_000);
    }

    #[test]
    fn test_discount_is_clamped_to_line_value() {
        // price 100.00, qty 3, requested discount 400.00
        let line = SaleLine::new("p1", 3, Money::from_minor(10_000))
            .with_discount(Money::from_minor(40_000));

        assert_eq!(line.effective_discount().minor(), 30_000);
        assert_eq!(line.total(), Money::zero());
    }

    #[test]
    fn test_negative_discount_is_clamped_to_zero() {
        let line = SaleLine::new("p1", 2, Money::from_minor(1000))
            .with_discount(Money::from_minor(-500));

        assert_eq!(line.effective_discount(), Money::zero());
        assert_eq!(line.total().minor(), 2000);
    }

    #[test]
    fn test_draft_totals() {
        let draft = SaleDraft::new(PaymentMethod::Cash)
            .add_line(SaleLine::new("p1", 2, Money::from_minor(5000)))
            .add_line(
                SaleLine::new("p2", 1, Money::from_minor(3000))
                    .with_discount(Money::from_minor(500)),
            );

        assert_eq!(draft.total_amount().minor(), 13_000);
        assert_eq!(draft.final_amount().minor(), 12_500);
    }

    #[test]
    fn test_purchase_draft_total() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let draft = PurchaseDraft::new("s1", date)
            .with_invoice_no("INV-42")
            .add_line(PurchaseLine::new("p1", 5, Money::from_minor(1000)))
            .add_line(PurchaseLine::new("p2", 2, Money::from_minor(250)));

        assert_eq!(draft.total_amount().minor(), 5500);
    }
}
