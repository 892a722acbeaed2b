//! Ledger error types.

use thiserror::Error;
use uuid::Uuid;

/// Error types for ledger validation and posting.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Transaction date is required.
    #[error("Transaction date is required")]
    MissingDate,

    /// Account reference is required.
    #[error("An account is required")]
    MissingAccount,

    /// Category reference is required.
    #[error("A category is required")]
    MissingCategory,

    /// Account exists but is deactivated.
    #[error("Account {0} is inactive")]
    InactiveAccount(Uuid),

    /// Fund exists but is deactivated.
    #[error("Fund {0} is inactive")]
    InactiveFund(Uuid),
}

impl From<LedgerError> for fiscus_shared::AppError {
    fn from(err: LedgerError) -> Self {
        Self::Validation(err.to_string())
    }
}
