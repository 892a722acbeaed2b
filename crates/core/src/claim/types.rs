//! Claim domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Claim status in the approval workflow.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
///
/// Approved and Rejected are terminal; nothing moves out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Awaiting a finance decision; editable and deletable by its submitter.
    Pending,
    /// Approved and converted into an expense transaction (terminal).
    Approved,
    /// Rejected with a reason (terminal).
    Rejected,
}

impl ClaimStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the claim can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated state transition with its audit trail data.
#[derive(Debug, Clone)]
pub enum ClaimAction {
    /// Approve a pending claim; the caller must post the linked
    /// expense transaction in the same unit of work.
    Approve {
        /// The new status (Approved).
        new_status: ClaimStatus,
        /// The finance user who decided.
        decided_by: Uuid,
        /// When the decision was made; the generated expense uses
        /// this date, not the original receipt date.
        decided_at: DateTime<Utc>,
    },
    /// Reject a pending claim.
    Reject {
        /// The new status (Rejected).
        new_status: ClaimStatus,
        /// The finance user who decided.
        decided_by: Uuid,
        /// When the decision was made.
        decided_at: DateTime<Utc>,
        /// The required rejection reason.
        reason: String,
    },
}

impl ClaimAction {
    /// Returns the status this action moves the claim into.
    #[must_use]
    pub const fn new_status(&self) -> ClaimStatus {
        match self {
            Self::Approve { new_status, .. } | Self::Reject { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ClaimStatus::Pending.as_str(), "pending");
        assert_eq!(ClaimStatus::Approved.as_str(), "approved");
        assert_eq!(ClaimStatus::Rejected.as_str(), "rejected");
    }

    #[rstest]
    #[case("pending", Some(ClaimStatus::Pending))]
    #[case("APPROVED", Some(ClaimStatus::Approved))]
    #[case("Rejected", Some(ClaimStatus::Rejected))]
    #[case("draft", None)]
    #[case("", None)]
    fn test_status_parse(#[case] input: &str, #[case] expected: Option<ClaimStatus>) {
        assert_eq!(ClaimStatus::parse(input), expected);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ClaimStatus::Pending.is_terminal());
        assert!(ClaimStatus::Approved.is_terminal());
        assert!(ClaimStatus::Rejected.is_terminal());
    }
}
