//! Branch and role authorization.
//!
//! One predicate answers every "may this caller touch this branch's
//! resource" question; the repositories call it before each operation
//! instead of scattering ad hoc checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Role scope ordering: `Branch < CrossBranch < Global`.
///
/// A branch-scoped user only sees their own branch; cross-branch and
/// global users bypass the branch filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Limited to the user's own branch.
    Branch,
    /// May act on any branch.
    CrossBranch,
    /// Full administrative reach.
    Global,
}

impl RoleScope {
    /// Returns the string representation of the scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::CrossBranch => "cross_branch",
            Self::Global => "global",
        }
    }

    /// Parses a scope from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "branch" => Some(Self::Branch),
            "cross_branch" => Some(Self::CrossBranch),
            "global" => Some(Self::Global),
            _ => None,
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved identity of the caller, supplied per request by the
/// session collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub user_id: Uuid,
    /// The branch the caller belongs to.
    pub branch_id: Uuid,
    /// Role scope.
    pub scope: RoleScope,
    /// Whether the caller holds the finance role (may post ledger
    /// mutations and decide claims).
    pub finance: bool,
}

/// Access errors.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The resource belongs to another branch.
    #[error("Resource belongs to another branch")]
    BranchMismatch,

    /// The operation requires the finance role.
    #[error("The finance role is required for this operation")]
    FinanceRequired,
}

impl From<AccessError> for fiscus_shared::AppError {
    fn from(err: AccessError) -> Self {
        Self::Permission(err.to_string())
    }
}

/// Returns true if the actor may access a resource owned by
/// `resource_branch`: always within their own branch, elsewhere only
/// with at least cross-branch scope.
#[must_use]
pub fn can_access_branch(actor: &Actor, resource_branch: Uuid) -> bool {
    actor.branch_id == resource_branch || actor.scope >= RoleScope::CrossBranch
}

/// Branch access as a guard.
///
/// # Errors
///
/// Returns `AccessError::BranchMismatch` when the predicate denies.
pub fn require_branch_access(actor: &Actor, resource_branch: Uuid) -> Result<(), AccessError> {
    if can_access_branch(actor, resource_branch) {
        Ok(())
    } else {
        Err(AccessError::BranchMismatch)
    }
}

/// Finance role as a guard; ledger mutations and claim decisions
/// require it, claim submission does not.
///
/// # Errors
///
/// Returns `AccessError::FinanceRequired` for non-finance callers.
pub fn require_finance(actor: &Actor) -> Result<(), AccessError> {
    if actor.finance {
        Ok(())
    } else {
        Err(AccessError::FinanceRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(scope: RoleScope, finance: bool) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            scope,
            finance,
        }
    }

    #[test]
    fn test_scope_ordering() {
        assert!(RoleScope::Branch < RoleScope::CrossBranch);
        assert!(RoleScope::CrossBranch < RoleScope::Global);
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(RoleScope::parse("branch"), Some(RoleScope::Branch));
        assert_eq!(RoleScope::parse("cross_branch"), Some(RoleScope::CrossBranch));
        assert_eq!(RoleScope::parse("GLOBAL"), Some(RoleScope::Global));
        assert_eq!(RoleScope::parse("admin"), None);
    }

    #[test]
    fn test_own_branch_always_allowed() {
        let a = actor(RoleScope::Branch, false);
        assert!(can_access_branch(&a, a.branch_id));
    }

    #[test]
    fn test_other_branch_denied_for_branch_scope() {
        let a = actor(RoleScope::Branch, true);
        let other = Uuid::new_v4();
        assert!(!can_access_branch(&a, other));
        assert!(matches!(
            require_branch_access(&a, other),
            Err(AccessError::BranchMismatch)
        ));
    }

    #[test]
    fn test_cross_branch_and_global_bypass_filter() {
        let other = Uuid::new_v4();
        assert!(can_access_branch(&actor(RoleScope::CrossBranch, false), other));
        assert!(can_access_branch(&actor(RoleScope::Global, false), other));
    }

    #[test]
    fn test_finance_guard() {
        assert!(require_finance(&actor(RoleScope::Branch, true)).is_ok());
        assert!(matches!(
            require_finance(&actor(RoleScope::Global, false)),
            Err(AccessError::FinanceRequired)
        ));
    }
}
