//! Signed balance effects of ledger transactions.
//!
//! Income adds to the owning account's balance, expense subtracts.
//! Reversal is negation, so delete is the exact inverse of create and
//! an edit is modeled as reversal of the old row followed by
//! application of the new one.

use rust_decimal::Decimal;

use super::types::TransactionKind;

/// Returns the signed delta a transaction applies to its account's
/// balance: `+amount` for income, `-amount` for expense.
#[must_use]
pub fn balance_effect(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// Returns the delta that undoes a previously applied transaction.
#[must_use]
pub fn reversal_effect(kind: TransactionKind, amount: Decimal) -> Decimal {
    -balance_effect(kind, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
        prop_oneof![
            Just(TransactionKind::Income),
            Just(TransactionKind::Expense),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Income increases a balance, expense decreases it.
        #[test]
        fn prop_effect_sign(amount in amount_strategy()) {
            prop_assert!(balance_effect(TransactionKind::Income, amount) > Decimal::ZERO);
            prop_assert!(balance_effect(TransactionKind::Expense, amount) < Decimal::ZERO);
        }

        /// Reversal exactly cancels the original effect, so deleting a
        /// transaction restores the pre-creation balance.
        #[test]
        fn prop_reversal_cancels_effect(
            kind in kind_strategy(),
            amount in amount_strategy(),
            balance in amount_strategy(),
        ) {
            let after_create = balance + balance_effect(kind, amount);
            let after_delete = after_create + reversal_effect(kind, amount);
            prop_assert_eq!(after_delete, balance);
        }

        /// Reverse-then-apply gives the same result whether or not the
        /// old and new rows target the same account; applied to one
        /// balance it is never double counted.
        #[test]
        fn prop_update_is_reverse_then_apply(
            old_kind in kind_strategy(),
            new_kind in kind_strategy(),
            old_amount in amount_strategy(),
            new_amount in amount_strategy(),
            balance in amount_strategy(),
        ) {
            let posted = balance + balance_effect(old_kind, old_amount);
            let updated =
                posted + reversal_effect(old_kind, old_amount) + balance_effect(new_kind, new_amount);
            prop_assert_eq!(updated, balance + balance_effect(new_kind, new_amount));
        }
    }

    /// Scenario from the ledger contract: account at 1000.00, post
    /// expense 200.00, edit it to 50.00, then delete it.
    #[test]
    fn test_expense_edit_delete_scenario() {
        let start = dec!(1000.00);

        let after_post = start + balance_effect(TransactionKind::Expense, dec!(200.00));
        assert_eq!(after_post, dec!(800.00));

        let after_edit = after_post
            + reversal_effect(TransactionKind::Expense, dec!(200.00))
            + balance_effect(TransactionKind::Expense, dec!(50.00));
        assert_eq!(after_edit, dec!(950.00));

        let after_delete = after_edit + reversal_effect(TransactionKind::Expense, dec!(50.00));
        assert_eq!(after_delete, dec!(1000.00));
    }

    #[test]
    fn test_income_effect() {
        assert_eq!(
            balance_effect(TransactionKind::Income, dec!(75.50)),
            dec!(75.50)
        );
        assert_eq!(
            reversal_effect(TransactionKind::Income, dec!(75.50)),
            dec!(-75.50)
        );
    }
}
