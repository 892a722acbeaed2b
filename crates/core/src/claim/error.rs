//! Claim workflow error types.

use thiserror::Error;

use super::types::ClaimStatus;

/// Error types for claim workflow transitions.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The requested transition is not valid from the current status.
    #[error("Cannot move claim from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ClaimStatus,
        /// Requested status.
        to: ClaimStatus,
    },

    /// Only pending claims may be edited.
    #[error("Only pending claims can be edited")]
    NotEditable,

    /// Only pending claims may be deleted.
    #[error("Only pending claims can be deleted")]
    NotDeletable,

    /// Only the submitter may edit or delete their claim.
    #[error("Only the submitter may modify this claim")]
    NotSubmitter,

    /// A rejection reason is required.
    #[error("A rejection reason is required")]
    ReasonRequired,

    /// Claim amount must be positive.
    #[error("Claim amount must be greater than zero")]
    NonPositiveAmount,

    /// A receipt reference is required at submission.
    #[error("A receipt is required to submit a claim")]
    ReceiptRequired,
}

impl From<ClaimError> for fiscus_shared::AppError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InvalidTransition { .. }
            | ClaimError::NotEditable
            | ClaimError::NotDeletable => Self::State(err.to_string()),
            ClaimError::NotSubmitter => Self::Permission(err.to_string()),
            ClaimError::ReasonRequired
            | ClaimError::NonPositiveAmount
            | ClaimError::ReceiptRequired => Self::Validation(err.to_string()),
        }
    }
}
