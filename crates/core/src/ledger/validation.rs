//! Transaction draft validation.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::TransactionDraft;

/// Validates a transaction draft before persistence.
///
/// Checks, in order: positive amount, presence of date, account, and
/// category. Fund allocation is optional; a missing fund means the
/// transaction falls into the branch's General Fund.
///
/// # Errors
///
/// Returns the first failing `LedgerError`.
pub fn validate_draft(draft: &TransactionDraft) -> Result<(), LedgerError> {
    if draft.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    if draft.date.is_none() {
        return Err(LedgerError::MissingDate);
    }
    if draft.account_id.is_none() {
        return Err(LedgerError::MissingAccount);
    }
    if draft.category_id.is_none() {
        return Err(LedgerError::MissingCategory);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::TransactionKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn valid_draft() -> TransactionDraft {
        TransactionDraft {
            kind: TransactionKind::Expense,
            date: NaiveDate::from_ymd_opt(2026, 3, 14),
            amount: dec!(200.00),
            account_id: Some(Uuid::new_v4()),
            category_id: Some(Uuid::new_v4()),
            fund_id: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&valid_draft()).is_ok());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut draft = valid_draft();
        draft.amount = Decimal::ZERO;
        assert!(matches!(
            validate_draft(&draft),
            Err(LedgerError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut draft = valid_draft();
        draft.amount = dec!(-10.00);
        assert!(matches!(
            validate_draft(&draft),
            Err(LedgerError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_missing_date_rejected() {
        let mut draft = valid_draft();
        draft.date = None;
        assert!(matches!(
            validate_draft(&draft),
            Err(LedgerError::MissingDate)
        ));
    }

    #[test]
    fn test_missing_account_rejected() {
        let mut draft = valid_draft();
        draft.account_id = None;
        assert!(matches!(
            validate_draft(&draft),
            Err(LedgerError::MissingAccount)
        ));
    }

    #[test]
    fn test_missing_category_rejected() {
        let mut draft = valid_draft();
        draft.category_id = None;
        assert!(matches!(
            validate_draft(&draft),
            Err(LedgerError::MissingCategory)
        ));
    }

    #[test]
    fn test_missing_fund_allowed() {
        let mut draft = valid_draft();
        draft.fund_id = None;
        assert!(validate_draft(&draft).is_ok());
    }
}
