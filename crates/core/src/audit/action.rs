//! Audit action names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state-changing actions the audit trail records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A ledger transaction was created.
    TransactionCreated,
    /// A ledger transaction was updated.
    TransactionUpdated,
    /// A ledger transaction was deleted.
    TransactionDeleted,
    /// A fund transfer was recorded.
    FundTransferCreated,
    /// A fund transfer was removed.
    FundTransferDeleted,
    /// A claim was submitted.
    ClaimSubmitted,
    /// A pending claim was edited by its submitter.
    ClaimUpdated,
    /// A pending claim was deleted by its submitter.
    ClaimDeleted,
    /// A claim was approved.
    ClaimApproved,
    /// A claim was rejected.
    ClaimRejected,
    /// An account was created.
    AccountCreated,
    /// An account was updated.
    AccountUpdated,
    /// An account was deactivated.
    AccountDeactivated,
    /// An account without transaction history was deleted.
    AccountDeleted,
    /// A fund was created.
    FundCreated,
    /// A fund was updated.
    FundUpdated,
    /// A fund was deactivated.
    FundDeactivated,
}

impl AuditAction {
    /// Returns the snake_case action name stored in the audit row.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionCreated => "transaction_created",
            Self::TransactionUpdated => "transaction_updated",
            Self::TransactionDeleted => "transaction_deleted",
            Self::FundTransferCreated => "fund_transfer_created",
            Self::FundTransferDeleted => "fund_transfer_deleted",
            Self::ClaimSubmitted => "claim_submitted",
            Self::ClaimUpdated => "claim_updated",
            Self::ClaimDeleted => "claim_deleted",
            Self::ClaimApproved => "claim_approved",
            Self::ClaimRejected => "claim_rejected",
            Self::AccountCreated => "account_created",
            Self::AccountUpdated => "account_updated",
            Self::AccountDeactivated => "account_deactivated",
            Self::AccountDeleted => "account_deleted",
            Self::FundCreated => "fund_created",
            Self::FundUpdated => "fund_updated",
            Self::FundDeactivated => "fund_deactivated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_snake_case() {
        assert_eq!(AuditAction::TransactionCreated.as_str(), "transaction_created");
        assert_eq!(AuditAction::ClaimApproved.as_str(), "claim_approved");
        assert_eq!(AuditAction::FundTransferDeleted.as_str(), "fund_transfer_deleted");
    }

    #[test]
    fn test_action_serde_matches_as_str() {
        let json = serde_json::to_string(&AuditAction::ClaimRejected).unwrap();
        assert_eq!(json, "\"claim_rejected\"");
    }
}
