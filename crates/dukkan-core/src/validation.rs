//! # Validation Module
//!
//! Input validation for drafts and processor inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / import job)                                     │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, invoked by the processors                       │
//! │  └── Business rule validation, always before the first write           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE / CHECK / foreign key constraints               │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::draft::{PurchaseDraft, SaleDraft};
use crate::error::ValidationError;
use crate::types::PaymentMethod;
use crate::{MAX_DRAFT_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use dukkan_core::validation::validate_product_code;
///
/// assert!(validate_product_code("COLA-330").is_ok());
/// assert!(validate_product_code("").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, supplier, account).
pub fn validate_name(name: &str) -> ValidationResult<()> {
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

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// Zero is allowed (free items); negative is not.
pub fn validate_price_minor(minor: i64) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment/transaction amount in minor units.
///
/// ## Rules
/// - Must be positive (> 0): zero or negative collections are meaningless
pub fn validate_amount_minor(minor: i64) -> ValidationResult<()> {
    if minor <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock movement amount. Sign carries meaning, so both signs
/// pass; only zero is rejected.
pub fn validate_movement_amount(amount: i64) -> ValidationResult<()> {
    if amount == 0 {
        return Err(ValidationError::ZeroMovement);
    }

    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

/// Validates a sale draft before the processor opens a transaction.
///
/// ## Rules
/// - At least one line, at most MAX_DRAFT_LINES
/// - Every quantity positive and within bounds, every price non-negative
/// - On-account sales must name a customer
pub fn validate_sale_draft(draft: &SaleDraft) -> ValidationResult<()> {
    if draft.lines.is_empty() {
        return Err(ValidationError::EmptyDraft);
    }

    if draft.lines.len() > MAX_DRAFT_LINES {
        return Err(ValidationError::DraftTooLarge {
            max: MAX_DRAFT_LINES,
        });
    }

    for line in &draft.lines {
        validate_quantity(line.quantity)?;
        validate_price_minor(line.price.minor())?;
    }

    if draft.payment_method == PaymentMethod::OnAccount && draft.customer_id.is_none() {
        return Err(ValidationError::CustomerRequired {
            method: draft.payment_method,
        });
    }

    Ok(())
}

/// Validates a purchase draft before the processor opens a transaction.
pub fn validate_purchase_draft(draft: &PurchaseDraft) -> ValidationResult<()> {
    if draft.supplier_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "supplier_id".to_string(),
        });
    }

    if draft.lines.is_empty() {
        return Err(ValidationError::EmptyDraft);
    }

    if draft.lines.len() > MAX_DRAFT_LINES {
        return Err(ValidationError::DraftTooLarge {
            max: MAX_DRAFT_LINES,
        });
    }

    for line in &draft.lines {
        validate_quantity(line.quantity)?;
        validate_price_minor(line.cost_price.minor())?;
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use dukkan_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{PurchaseLine, SaleLine};
    use crate::money::Money;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("COLA-330").is_ok());
        assert!(validate_product_code("ABC123").is_ok());
        assert!(validate_product_code("urun_1").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price_minor(0).is_ok());
        assert!(validate_price_minor(-1).is_err());

        assert!(validate_amount_minor(1).is_ok());
        assert!(validate_amount_minor(0).is_err());
        assert!(validate_amount_minor(-100).is_err());

        assert!(validate_movement_amount(-5).is_ok());
        assert!(validate_movement_amount(5).is_ok());
        assert!(validate_movement_amount(0).is_err());
    }

    #[test]
    fn test_empty_sale_draft_rejected() {
        let draft = SaleDraft::new(PaymentMethod::Cash);
        assert!(matches!(
            validate_sale_draft(&draft),
            Err(ValidationError::EmptyDraft)
        ));
    }

    #[test]
    fn test_on_account_requires_customer() {
        let draft = SaleDraft::new(PaymentMethod::OnAccount)
            .add_line(SaleLine::new("p1", 1, Money::from_minor(100)));

        assert!(matches!(
            validate_sale_draft(&draft),
            Err(ValidationError::CustomerRequired { .. })
        ));

        let with_customer = draft.with_customer("c1");
        assert!(validate_sale_draft(&with_customer).is_ok());
    }

    #[test]
    fn test_purchase_draft_validation() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let empty = PurchaseDraft::new("s1", date);
        assert!(matches!(
            validate_purchase_draft(&empty),
            Err(ValidationError::EmptyDraft)
        ));

        let ok = PurchaseDraft::new("s1", date)
            .add_line(PurchaseLine::new("p1", 5, Money::from_minor(1000)));
        assert!(validate_purchase_draft(&ok).is_ok());

        let bad_qty = PurchaseDraft::new("s1", date)
            .add_line(PurchaseLine::new("p1", 0, Money::from_minor(1000)));
        assert!(validate_purchase_draft(&bad_qty).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
