//! # Transaction Processors
//!
//! Each processor commits one kind of unit of work. The contract is the same
//! for all of them:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Processor Commit Protocol                           │
//! │                                                                         │
//! │  1. authorize(capability)      ─┐                                      │
//! │  2. validate(input)             ├── before any write; a failure here   │
//! │  3. pre-read referenced rows   ─┘   changes nothing                    │
//! │                                                                         │
//! │  4. BEGIN                                                              │
//! │     ├── append document rows (header, lines)                           │
//! │     ├── append ledger rows (movements, payments, transactions)         │
//! │     └── relative-update cached balances (x = x + ?)                    │
//! │  5. COMMIT                                                             │
//! │                                                                         │
//! │  Any error between BEGIN and COMMIT drops the transaction, which       │
//! │  rolls it back: zero rows visible, caller keeps its draft and may      │
//! │  resubmit. There is no partial outcome.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once a commit has started it is not cancellable mid-flight; callers that
//! time out must treat the outcome as unknown and re-query, never assume
//! partial effects.

pub mod account;
pub mod movement;
pub mod payment;
pub mod purchase;
pub mod sale;

use thiserror::Error;

use crate::error::DbError;
use dukkan_core::{AccessError, ValidationError};

// =============================================================================
// Oversell Policy
// =============================================================================

/// What to do when a sale would drive stock negative.
///
/// The default is `Allow`: the register never blocks a customer standing at
/// the counter, and low stock is surfaced as a warning
/// (`ProductRepository::below_critical`). `Block` turns the decrement into a
/// guarded compare-and-decrement and rejects the whole sale instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversellPolicy {
    /// Stock may go negative; the movement ledger still records everything.
    #[default]
    Allow,
    /// Reject sales that would take stock below zero.
    Block,
}

// =============================================================================
// Engine Error
// =============================================================================

/// Processor-level error union.
///
/// By construction, `Validation` and `Access` mean nothing was written.
/// `Db` after a commit started means the whole unit of work rolled back.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operator's role lacks the capability. Nothing was written.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A blocking oversell policy rejected the sale. Rolled back.
    #[error("insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Storage failure. If a commit had started, it rolled back.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl EngineError {
    /// Whether retrying the same call later could succeed (the store was
    /// unreachable or busy). The engine never auto-retries; this is a hint
    /// for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Db(db) => db.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for processor operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let busy = EngineError::Db(DbError::PoolExhausted);
        assert!(busy.is_retryable());

        let not_found = EngineError::Db(DbError::not_found("Product", "p1"));
        assert!(!not_found.is_retryable());

        let invalid = EngineError::Validation(ValidationError::EmptyDraft);
        assert!(!invalid.is_retryable());
    }
}
