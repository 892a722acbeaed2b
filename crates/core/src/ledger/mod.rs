//! Income/expense ledger logic.
//!
//! An account carries a maintained running balance; every transaction
//! posting, edit, or removal mutates it through the signed effect
//! computed here. Edits always reverse the old effect before applying
//! the new one, which is what keeps replayed history and the stored
//! balance in agreement.

pub mod effect;
pub mod error;
pub mod types;
pub mod validation;

pub use effect::{balance_effect, reversal_effect};
pub use error::LedgerError;
pub use types::{TransactionDraft, TransactionKind};
pub use validation::validate_draft;
