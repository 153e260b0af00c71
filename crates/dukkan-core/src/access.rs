//! # Access Control
//!
//! Roles, capabilities and the explicit business context every processor
//! call carries.
//!
//! ## Why a Context Struct?
//! The predecessor kept the signed-in business and role in ambient session
//! state and gated operations with scattered UI conditionals. Here the
//! tenant and the role travel **with the call**: a processor receives a
//! [`BusinessContext`] and performs its own capability check before any
//! write. No global state, no way to forget the check.
//!
//! ## Role Matrix
//! ```text
//! ┌────────────────────┬───────┬───────┬─────────────┐
//! │ Capability         │ Staff │ Admin │ SuperAdmin  │
//! ├────────────────────┼───────┼───────┼─────────────┤
//! │ RecordSale         │   ✓   │   ✓   │      ✓      │
//! │ RecordPayment      │   ✓   │   ✓   │      ✓      │
//! │ AdjustStock        │   ✓   │   ✓   │      ✓      │
//! │ RecordPurchase     │       │   ✓   │      ✓      │
//! │ ManageAccounts     │       │   ✓   │      ✓      │
//! │ RecordExpense      │       │   ✓   │      ✓      │
//! │ ImportData         │       │   ✓   │      ✓      │
//! │ ViewReports        │       │   ✓   │      ✓      │
//! └────────────────────┴───────┴───────┴─────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Roles & Capabilities
// =============================================================================

/// The role of the operator performing a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Register staff: sales, collections, stock corrections.
    Staff,
    /// Business owner/manager: everything within the business.
    Admin,
    /// Platform operator. Same in-business rights as Admin.
    SuperAdmin,
}

/// A single permissible operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RecordSale,
    RecordPurchase,
    RecordPayment,
    AdjustStock,
    ManageAccounts,
    RecordExpense,
    ImportData,
    ViewReports,
}

impl Role {
    /// Whether this role may exercise the given capability.
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin | Role::SuperAdmin => true,
            Role::Staff => matches!(capability, RecordSale | RecordPayment | AdjustStock),
        }
    }
}

// =============================================================================
// Business Context
// =============================================================================

/// The explicit tenant + operator context passed into every processor call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    /// The business (tenant) all reads and writes are scoped to.
    pub business_id: String,
    /// The operator's role, checked against each operation's capability.
    pub role: Role,
}

impl BusinessContext {
    pub fn new(business_id: impl Into<String>, role: Role) -> Self {
        BusinessContext {
            business_id: business_id.into(),
            role,
        }
    }

    /// Fails with [`AccessError`] unless the context's role has the
    /// capability. Processors call this before any validation or write.
    pub fn authorize(&self, capability: Capability) -> Result<(), AccessError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(AccessError::Denied {
                role: self.role,
                capability,
            })
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Raised when a role lacks the capability for the requested operation.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("role {role:?} is not allowed to {capability:?}")]
    Denied { role: Role, capability: Capability },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_can_sell_but_not_purchase() {
        assert!(Role::Staff.allows(Capability::RecordSale));
        assert!(Role::Staff.allows(Capability::RecordPayment));
        assert!(!Role::Staff.allows(Capability::RecordPurchase));
        assert!(!Role::Staff.allows(Capability::ManageAccounts));
        assert!(!Role::Staff.allows(Capability::ViewReports));
    }

    #[test]
    fn test_admin_has_everything() {
        for capability in [
            Capability::RecordSale,
            Capability::RecordPurchase,
            Capability::RecordPayment,
            Capability::AdjustStock,
            Capability::ManageAccounts,
            Capability::RecordExpense,
            Capability::ImportData,
            Capability::ViewReports,
        ] {
            assert!(Role::Admin.allows(capability));
            assert!(Role::SuperAdmin.allows(capability));
        }
    }

    #[test]
    fn test_context_authorize() {
        let ctx = BusinessContext::new("b1", Role::Staff);
        assert!(ctx.authorize(Capability::RecordSale).is_ok());

        let err = ctx.authorize(Capability::ImportData).unwrap_err();
        assert!(err.to_string().contains("ImportData"));
    }
}
