//! Fund balance derivation.

use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Aggregated activity scoped to one fund.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundActivity {
    /// Sum of income transactions allocated to the fund.
    pub income: Decimal,
    /// Sum of expense transactions allocated to the fund.
    pub expense: Decimal,
    /// Sum of transfers into the fund.
    pub transfers_in: Decimal,
    /// Sum of transfers out of the fund.
    pub transfers_out: Decimal,
}

/// Extra aggregates only the General Fund absorbs: everything in the
/// branch that no fund explicitly claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralFundExtras {
    /// Sum of income transactions with no fund allocation.
    pub unallocated_income: Decimal,
    /// Sum of expense transactions with no fund allocation.
    pub unallocated_expense: Decimal,
    /// Sum of starting balances of the branch's active accounts.
    pub starting_balances: Decimal,
}

/// Computes a fund's balance from its aggregated activity.
///
/// ```text
/// balance = income - expense + transfers_in - transfers_out
///         + [general] (unallocated_income - unallocated_expense
///                      + starting_balances)
/// ```
///
/// Pass `extras` only for the branch's General Fund; with no activity
/// at all the result is zero, so an empty branch reconciles trivially.
#[must_use]
pub fn derive_balance(activity: FundActivity, extras: Option<GeneralFundExtras>) -> Decimal {
    let own = activity.income - activity.expense + activity.transfers_in - activity.transfers_out;
    match extras {
        Some(e) => own + e.unallocated_income - e.unallocated_expense + e.starting_balances,
        None => own,
    }
}

/// Ordering for fund listings: the General Fund first, the rest
/// alphabetically by name.
#[must_use]
pub fn fund_ordering(a_is_general: bool, a_name: &str, b_is_general: bool, b_name: &str) -> Ordering {
    match (a_is_general, b_is_general) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a_name.to_lowercase().cmp(&b_name.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_fund_is_zero() {
        assert_eq!(derive_balance(FundActivity::default(), None), Decimal::ZERO);
        assert_eq!(
            derive_balance(FundActivity::default(), Some(GeneralFundExtras::default())),
            Decimal::ZERO
        );
    }

    /// Create a fund, post income to it, transfer half out: the
    /// remaining half is what derivation reports.
    #[test]
    fn test_income_then_half_transferred_out() {
        let activity = FundActivity {
            income: dec!(500.00),
            transfers_out: dec!(250.00),
            ..Default::default()
        };
        assert_eq!(derive_balance(activity, None), dec!(250.00));
    }

    /// Transferring 100.00 from the General Fund to a named fund moves
    /// exactly that amount between the two derived balances; removing
    /// the transfer restores both with no separate reversal step.
    #[test]
    fn test_transfer_moves_derived_balance() {
        let extras = GeneralFundExtras {
            starting_balances: dec!(1000.00),
            ..Default::default()
        };

        let general = FundActivity {
            transfers_out: dec!(100.00),
            ..Default::default()
        };
        let building = FundActivity {
            transfers_in: dec!(100.00),
            ..Default::default()
        };

        assert_eq!(derive_balance(general, Some(extras)), dec!(900.00));
        assert_eq!(derive_balance(building, None), dec!(100.00));

        // Transfer row deleted: both sides recompute from scratch.
        assert_eq!(
            derive_balance(FundActivity::default(), Some(extras)),
            dec!(1000.00)
        );
        assert_eq!(derive_balance(FundActivity::default(), None), Decimal::ZERO);
    }

    #[test]
    fn test_general_fund_absorbs_unallocated() {
        let extras = GeneralFundExtras {
            unallocated_income: dec!(300.00),
            unallocated_expense: dec!(120.00),
            starting_balances: dec!(1000.00),
        };
        assert_eq!(
            derive_balance(FundActivity::default(), Some(extras)),
            dec!(1180.00)
        );
    }

    #[test]
    fn test_fund_ordering_general_first() {
        assert_eq!(
            fund_ordering(true, "General Fund", false, "Building Fund"),
            std::cmp::Ordering::Less
        );
        assert_eq!(
            fund_ordering(false, "Building Fund", true, "General Fund"),
            std::cmp::Ordering::Greater
        );
        assert_eq!(
            fund_ordering(false, "building", false, "Missions"),
            std::cmp::Ordering::Less
        );
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A transfer between two funds in the same branch never
        /// changes the branch total: what one side gains the other
        /// loses exactly.
        #[test]
        fn prop_transfers_conserve_branch_total(
            income_a in amount_strategy(),
            income_b in amount_strategy(),
            transfer in amount_strategy(),
        ) {
            let a = FundActivity {
                income: income_a,
                transfers_out: transfer,
                ..Default::default()
            };
            let b = FundActivity {
                income: income_b,
                transfers_in: transfer,
                ..Default::default()
            };

            let total = derive_balance(a, None) + derive_balance(b, None);
            prop_assert_eq!(total, income_a + income_b);
        }

        /// Sum of all fund balances equals the sum of account activity:
        /// allocated plus unallocated income/expense plus starting
        /// balances, the reconciliation invariant between funds and
        /// accounts.
        #[test]
        fn prop_funds_reconcile_with_accounts(
            allocated_income in amount_strategy(),
            allocated_expense in amount_strategy(),
            unallocated_income in amount_strategy(),
            unallocated_expense in amount_strategy(),
            starting in amount_strategy(),
            transfer in amount_strategy(),
        ) {
            let named = FundActivity {
                income: allocated_income,
                expense: allocated_expense,
                transfers_in: transfer,
                ..Default::default()
            };
            let general = FundActivity {
                transfers_out: transfer,
                ..Default::default()
            };
            let extras = GeneralFundExtras {
                unallocated_income,
                unallocated_expense,
                starting_balances: starting,
            };

            let fund_total = derive_balance(named, None) + derive_balance(general, Some(extras));
            let account_total = starting + allocated_income + unallocated_income
                - allocated_expense - unallocated_expense;
            prop_assert_eq!(fund_total, account_total);
        }
    }
}
