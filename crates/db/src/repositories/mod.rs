//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every multi-step mutation runs inside one database
//! transaction with `SELECT ... FOR UPDATE` on the affected account
//! rows; audit rows are written inside the same transaction so the
//! mutation and its trail commit together.

use uuid::Uuid;

pub mod account;
pub mod audit;
pub mod claim;
pub mod fund;
pub mod transaction;
pub mod transfer;

pub use account::{AccountError, AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use audit::{AuditFilter, AuditLogRepository};
pub use claim::{ClaimRepository, ClaimStoreError, SubmitClaimInput, UpdateClaimInput};
pub use fund::{FundError, FundRepository, FundWithBalance};
pub use transaction::{
    CreateTransactionInput, TransactionError, TransactionFilter, TransactionRepository,
    UpdateTransactionInput,
};
pub use transfer::{CreateTransferInput, FundTransferRepository, TransferError};

/// Request-scoped attribution attached to every audit row.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    /// The acting user, when the mutation is user-initiated.
    pub actor: Option<Uuid>,
    /// Client IP captured at the API boundary.
    pub ip: Option<String>,
}
