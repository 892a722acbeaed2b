//! Database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two kinds of ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering an account.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money leaving an account.
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Claim lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "claim_status")]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Awaiting a finance decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved and posted as an expense (terminal).
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected with a reason (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// User role scope: branch < cross_branch < global.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_scope")]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Limited to the user's own branch.
    #[sea_orm(string_value = "branch")]
    Branch,
    /// May act on any branch.
    #[sea_orm(string_value = "cross_branch")]
    CrossBranch,
    /// Full administrative reach.
    #[sea_orm(string_value = "global")]
    Global,
}
