//! Derived fund balances.
//!
//! Funds are virtual partitions of branch money; nothing is stored per
//! fund. A fund's balance is recomputed on demand from the transaction
//! and transfer rows that mention it, so there is no stored value to
//! drift and no reversal step when a transfer is removed.

pub mod derive;

pub use derive::{FundActivity, GeneralFundExtras, derive_balance, fund_ordering};
