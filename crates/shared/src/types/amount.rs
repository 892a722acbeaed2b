//! Monetary amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All monetary values are `rust_decimal::Decimal` carried with two
//! decimal places of fraction; the system is single-currency.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to two decimal places (banker's rounding).
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Formats an amount as a 2-decimal-fraction string for API responses.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_amount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.00))]
    #[case(dec!(10.015), dec!(10.02))]
    #[case(dec!(10.1), dec!(10.1))]
    #[case(dec!(-3.333), dec!(-3.33))]
    fn test_round_amount_two_places(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[rstest]
    #[case(dec!(1000), "1000.00")]
    #[case(dec!(75.5), "75.50")]
    #[case(dec!(-200.456), "-200.46")]
    fn test_format_amount(#[case] input: Decimal, #[case] expected: &str) {
        assert_eq!(format_amount(input), expected);
    }
}
