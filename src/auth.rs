use crate::core::{DomainError, Result, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Opaque grantable capability, compared by set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope identifiers understood by the entity operations.
pub mod scopes {
    pub mod customer {
        use crate::auth::ScopeId;

        pub const ALL: ScopeId = ScopeId(1);
        pub const LIST: ScopeId = ScopeId(2);
        pub const SAVE: ScopeId = ScopeId(3);
        pub const GET_BY_ID: ScopeId = ScopeId(4);
        pub const UPDATE: ScopeId = ScopeId(5);
        pub const DELETE: ScopeId = ScopeId(6);
    }

    pub mod order {
        use crate::auth::ScopeId;

        pub const ALL: ScopeId = ScopeId(11);
        pub const LIST: ScopeId = ScopeId(12);
        pub const SAVE: ScopeId = ScopeId(13);
        pub const GET_BY_ID: ScopeId = ScopeId(14);
        pub const UPDATE: ScopeId = ScopeId(15);
        pub const DELETE: ScopeId = ScopeId(16);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Allow iff the caller holds the broad entity-wide scope or the specific
/// operation scope.
pub fn decide(caller_permissions: &HashSet<ScopeId>, broad: ScopeId, specific: ScopeId) -> Decision {
    if caller_permissions.contains(&broad) || caller_permissions.contains(&specific) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Entity operations guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Customers,
    SaveCustomer,
    GetCustomerById,
    UpdateCustomer,
    DeleteCustomer,
    Orders,
    SaveOrder,
    GetOrderById,
    UpdateOrder,
    DeleteOrder,
}

impl Operation {
    /// `(broad, specific)` scope pair for this operation.
    pub fn scopes(&self) -> (ScopeId, ScopeId) {
        use scopes::{customer, order};

        match self {
            Operation::Customers => (customer::ALL, customer::LIST),
            Operation::SaveCustomer => (customer::ALL, customer::SAVE),
            Operation::GetCustomerById => (customer::ALL, customer::GET_BY_ID),
            Operation::UpdateCustomer => (customer::ALL, customer::UPDATE),
            Operation::DeleteCustomer => (customer::ALL, customer::DELETE),
            Operation::Orders => (order::ALL, order::LIST),
            Operation::SaveOrder => (order::ALL, order::SAVE),
            Operation::GetOrderById => (order::ALL, order::GET_BY_ID),
            Operation::UpdateOrder => (order::ALL, order::UPDATE),
            Operation::DeleteOrder => (order::ALL, order::DELETE),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Customers => "customers",
            Operation::SaveCustomer => "saveCustomer",
            Operation::GetCustomerById => "getCustomerById",
            Operation::UpdateCustomer => "updateCustomer",
            Operation::DeleteCustomer => "deleteCustomer",
            Operation::Orders => "orders",
            Operation::SaveOrder => "saveOrder",
            Operation::GetOrderById => "getOrderById",
            Operation::UpdateOrder => "updateOrder",
            Operation::DeleteOrder => "deleteOrder",
        }
    }
}

/// The identity and permission set behind one operation, as produced by the
/// (external) token validation layer.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    user_id: Option<UserId>,
    permissions: HashSet<ScopeId>,
    trusted: bool,
}

impl Caller {
    pub fn new(user_id: Option<UserId>, permissions: impl IntoIterator<Item = ScopeId>) -> Self {
        Self {
            user_id,
            permissions: permissions.into_iter().collect(),
            trusted: false,
        }
    }

    /// No identity and no permissions.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// In-process caller with no request attached (seeding, maintenance).
    /// Skips the scope check.
    pub fn system() -> Self {
        Self {
            trusted: true,
            ..Self::default()
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Adds a permission if it doesn't already exist
    pub fn grant(&mut self, scope: ScopeId) -> bool {
        self.permissions.insert(scope)
    }

    pub fn revoke(&mut self, scope: ScopeId) -> bool {
        self.permissions.remove(&scope)
    }

    /// Fail with `AccessDenied` unless the caller may run `operation`.
    pub fn authorize(&self, operation: Operation) -> Result<()> {
        if self.trusted {
            return Ok(());
        }

        let (broad, specific) = operation.scopes();
        match decide(&self.permissions, broad, specific) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                warn!(
                    operation = operation.name(),
                    user = ?self.user_id,
                    "access denied"
                );
                Err(DomainError::AccessDenied)
            }
        }
    }
}
