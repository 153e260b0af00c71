//! # Error Types
//!
//! Domain-specific error types for dukkan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dukkan-core errors                                                    │
//! │  ├── ValidationError  - Input validation failures (this file)          │
//! │  └── AccessError      - Capability denials (access.rs)                 │
//! │                                                                         │
//! │  dukkan-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - Processor-level union of all of the above      │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → caller keeps its draft and      │
//! │  may resubmit; nothing was written.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field names, bounds, methods)
//! 3. Errors are enum variants, never String
//! 4. Validation fires before any write begins

use thiserror::Error;

use crate::types::PaymentMethod;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a draft or input doesn't meet requirements. They are
/// raised before any write begins, so no state has changed.
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

    /// A draft was submitted with no lines.
    #[error("draft has no lines")]
    EmptyDraft,

    /// Too many lines in one draft.
    #[error("draft cannot have more than {max} lines")]
    DraftTooLarge { max: usize },

    /// An on-account sale was submitted without a customer.
    #[error("payment method {method:?} requires a customer")]
    CustomerRequired { method: PaymentMethod },

    /// A stock movement with amount 0 says nothing and is rejected.
    #[error("movement amount must not be zero")]
    ZeroMovement,
}

// =============================================================================
// Unit Tests
// =============================================================================
