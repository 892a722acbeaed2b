//! Claim workflow state machine.
//!
//! Stateless transition validation in one place: the repositories call
//! in here before touching any row, so every path through the system
//! enforces the same one-way lifecycle.

use chrono::Utc;
use uuid::Uuid;

use super::error::ClaimError;
use super::types::{ClaimAction, ClaimStatus};

/// Stateless service validating claim lifecycle transitions.
pub struct ClaimWorkflow;

impl ClaimWorkflow {
    /// Approve a pending claim.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::InvalidTransition` unless the claim is
    /// pending; a second approval of an already-approved claim lands
    /// here and must post nothing.
    pub fn approve(current: ClaimStatus, decided_by: Uuid) -> Result<ClaimAction, ClaimError> {
        match current {
            ClaimStatus::Pending => Ok(ClaimAction::Approve {
                new_status: ClaimStatus::Approved,
                decided_by,
                decided_at: Utc::now(),
            }),
            _ => Err(ClaimError::InvalidTransition {
                from: current,
                to: ClaimStatus::Approved,
            }),
        }
    }

    /// Reject a pending claim with a required reason.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::ReasonRequired` for a blank reason and
    /// `ClaimError::InvalidTransition` unless the claim is pending.
    pub fn reject(
        current: ClaimStatus,
        decided_by: Uuid,
        reason: String,
    ) -> Result<ClaimAction, ClaimError> {
        if reason.trim().is_empty() {
            return Err(ClaimError::ReasonRequired);
        }

        match current {
            ClaimStatus::Pending => Ok(ClaimAction::Reject {
                new_status: ClaimStatus::Rejected,
                decided_by,
                decided_at: Utc::now(),
                reason,
            }),
            _ => Err(ClaimError::InvalidTransition {
                from: current,
                to: ClaimStatus::Rejected,
            }),
        }
    }

    /// Checks that a claim may be edited: still pending, and the
    /// caller is its submitter.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::NotEditable` or `ClaimError::NotSubmitter`.
    pub fn ensure_editable(
        current: ClaimStatus,
        submitted_by: Uuid,
        caller: Uuid,
    ) -> Result<(), ClaimError> {
        if current != ClaimStatus::Pending {
            return Err(ClaimError::NotEditable);
        }
        if submitted_by != caller {
            return Err(ClaimError::NotSubmitter);
        }
        Ok(())
    }

    /// Checks that a claim may be deleted: same rule as editing.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::NotDeletable` or `ClaimError::NotSubmitter`.
    pub fn ensure_deletable(
        current: ClaimStatus,
        submitted_by: Uuid,
        caller: Uuid,
    ) -> Result<(), ClaimError> {
        if current != ClaimStatus::Pending {
            return Err(ClaimError::NotDeletable);
        }
        if submitted_by != caller {
            return Err(ClaimError::NotSubmitter);
        }
        Ok(())
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    #[must_use]
    pub fn is_valid_transition(from: ClaimStatus, to: ClaimStatus) -> bool {
        matches!(
            (from, to),
            (
                ClaimStatus::Pending,
                ClaimStatus::Approved | ClaimStatus::Rejected
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_approve_from_pending() {
        let user = Uuid::new_v4();
        let action = ClaimWorkflow::approve(ClaimStatus::Pending, user).unwrap();
        assert_eq!(action.new_status(), ClaimStatus::Approved);
    }

    #[test]
    fn test_approve_twice_fails() {
        let user = Uuid::new_v4();
        let result = ClaimWorkflow::approve(ClaimStatus::Approved, user);
        assert!(matches!(
            result,
            Err(ClaimError::InvalidTransition {
                from: ClaimStatus::Approved,
                ..
            })
        ));
    }

    #[test]
    fn test_approve_rejected_fails() {
        let result = ClaimWorkflow::approve(ClaimStatus::Rejected, Uuid::new_v4());
        assert!(matches!(result, Err(ClaimError::InvalidTransition { .. })));
    }

    #[test]
    fn test_reject_from_pending() {
        let action =
            ClaimWorkflow::reject(ClaimStatus::Pending, Uuid::new_v4(), "No receipt".to_string())
                .unwrap();
        assert_eq!(action.new_status(), ClaimStatus::Rejected);
    }

    #[test]
    fn test_reject_empty_reason_fails() {
        let result = ClaimWorkflow::reject(ClaimStatus::Pending, Uuid::new_v4(), String::new());
        assert!(matches!(result, Err(ClaimError::ReasonRequired)));
    }

    #[test]
    fn test_reject_whitespace_reason_fails() {
        let result =
            ClaimWorkflow::reject(ClaimStatus::Pending, Uuid::new_v4(), "   ".to_string());
        assert!(matches!(result, Err(ClaimError::ReasonRequired)));
    }

    #[test]
    fn test_reject_terminal_fails() {
        let result =
            ClaimWorkflow::reject(ClaimStatus::Approved, Uuid::new_v4(), "late".to_string());
        assert!(matches!(result, Err(ClaimError::InvalidTransition { .. })));
    }

    #[test]
    fn test_edit_pending_by_submitter() {
        let submitter = Uuid::new_v4();
        assert!(ClaimWorkflow::ensure_editable(ClaimStatus::Pending, submitter, submitter).is_ok());
    }

    #[test]
    fn test_edit_by_other_user_fails() {
        let result = ClaimWorkflow::ensure_editable(
            ClaimStatus::Pending,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        assert!(matches!(result, Err(ClaimError::NotSubmitter)));
    }

    #[test]
    fn test_edit_terminal_fails() {
        let submitter = Uuid::new_v4();
        let result = ClaimWorkflow::ensure_editable(ClaimStatus::Approved, submitter, submitter);
        assert!(matches!(result, Err(ClaimError::NotEditable)));
    }

    #[test]
    fn test_delete_rules_match_edit_rules() {
        let submitter = Uuid::new_v4();
        assert!(
            ClaimWorkflow::ensure_deletable(ClaimStatus::Pending, submitter, submitter).is_ok()
        );
        assert!(matches!(
            ClaimWorkflow::ensure_deletable(ClaimStatus::Rejected, submitter, submitter),
            Err(ClaimError::NotDeletable)
        ));
        assert!(matches!(
            ClaimWorkflow::ensure_deletable(ClaimStatus::Pending, submitter, Uuid::new_v4()),
            Err(ClaimError::NotSubmitter)
        ));
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(ClaimWorkflow::is_valid_transition(
            ClaimStatus::Pending,
            ClaimStatus::Approved
        ));
        assert!(ClaimWorkflow::is_valid_transition(
            ClaimStatus::Pending,
            ClaimStatus::Rejected
        ));
        assert!(!ClaimWorkflow::is_valid_transition(
            ClaimStatus::Approved,
            ClaimStatus::Rejected
        ));
        assert!(!ClaimWorkflow::is_valid_transition(
            ClaimStatus::Rejected,
            ClaimStatus::Pending
        ));
    }

    fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
        prop_oneof![
            Just(ClaimStatus::Pending),
            Just(ClaimStatus::Approved),
            Just(ClaimStatus::Rejected),
        ]
    }

    fn terminal_strategy() -> impl Strategy<Value = ClaimStatus> {
        prop_oneof![Just(ClaimStatus::Approved), Just(ClaimStatus::Rejected)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal states admit no transition, edit, or deletion at all.
        #[test]
        fn prop_terminal_states_are_final(status in terminal_strategy()) {
            let user = Uuid::new_v4();
            prop_assert!(ClaimWorkflow::approve(status, user).is_err());
            prop_assert!(
                ClaimWorkflow::reject(status, user, "reason".to_string()).is_err()
            );
            prop_assert!(ClaimWorkflow::ensure_editable(status, user, user).is_err());
            prop_assert!(ClaimWorkflow::ensure_deletable(status, user, user).is_err());
        }

        /// Every valid transition starts from Pending.
        #[test]
        fn prop_only_pending_transitions(from in status_strategy(), to in status_strategy()) {
            if ClaimWorkflow::is_valid_transition(from, to) {
                prop_assert_eq!(from, ClaimStatus::Pending);
                prop_assert!(to.is_terminal());
            }
        }
    }
}
