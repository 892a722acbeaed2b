//! Ledger domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The two kinds of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering an account.
    Income,
    /// Money leaving an account.
    Expense,
}

impl TransactionKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fields of a transaction that are subject to validation before
/// persistence, independent of how the row is stored.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Calendar date of the transaction (no time component).
    pub date: Option<NaiveDate>,
    /// Amount; must be strictly positive.
    pub amount: Decimal,
    /// The account the money moves through.
    pub account_id: Option<Uuid>,
    /// Spending/income category.
    pub category_id: Option<Uuid>,
    /// Optional fund allocation; `None` means the General Fund absorbs it.
    pub fund_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(TransactionKind::Income.as_str(), "income");
        assert_eq!(TransactionKind::Expense.as_str(), "expense");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            TransactionKind::parse("income"),
            Some(TransactionKind::Income)
        );
        assert_eq!(
            TransactionKind::parse("EXPENSE"),
            Some(TransactionKind::Expense)
        );
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", TransactionKind::Income), "income");
    }
}
