//! Account repository.
//!
//! Accounts hold the only stored balance in the system. Every balance
//! write goes through `lock_for_update` + `apply_balance_delta`, the
//! row-level serialization point for concurrent ledger mutations.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_shared::types::amount::round_amount;

use crate::entities::{accounts, transactions};
use crate::repositories::{audit, AuditContext};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found in the branch.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Account name already exists in the branch.
    #[error("Account name '{0}' already exists")]
    NameExists(String),

    /// The branch default account cannot be deactivated.
    #[error("The default account cannot be deactivated")]
    DefaultNotDeactivatable,

    /// Accounts with transaction history cannot be deleted.
    #[error("Cannot delete account: {0} transactions reference it")]
    HasTransactions(u64),

    /// Negative starting balance supplied.
    #[error("Starting balance cannot be negative")]
    NegativeStartingBalance,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for fiscus_shared::AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(id) => Self::NotFound(format!("account {id}")),
            AccountError::NameExists(_)
            | AccountError::DefaultNotDeactivatable
            | AccountError::HasTransactions(_)
            | AccountError::NegativeStartingBalance => Self::Validation(err.to_string()),
            AccountError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning branch.
    pub branch_id: Uuid,
    /// Account name (unique within the branch).
    pub name: String,
    /// Opening amount; becomes the initial running balance and is
    /// immutable afterwards.
    pub starting_balance: Decimal,
    /// Whether this account becomes the branch default.
    pub is_default: bool,
}

/// Input for updating an account. Starting balance is immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New account name.
    pub name: Option<String>,
}

/// Account repository for CRUD and balance operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account; the running balance starts at the starting
    /// balance. When `is_default` is set, the previous branch default
    /// is cleared in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken in the branch, the
    /// starting balance is negative, or the database fails.
    pub async fn create(
        &self,
        input: CreateAccountInput,
        ctx: &AuditContext,
    ) -> Result<accounts::Model, AccountError> {
        if input.starting_balance < Decimal::ZERO {
            return Err(AccountError::NegativeStartingBalance);
        }

        let existing = accounts::Entity::find()
            .filter(accounts::Column::BranchId.eq(input.branch_id))
            .filter(accounts::Column::Name.eq(&input.name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountError::NameExists(input.name));
        }

        let starting = round_amount(input.starting_balance);
        let txn = self.db.begin().await?;

        if input.is_default {
            Self::clear_default(&txn, input.branch_id).await?;
        }

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(input.branch_id),
            name: Set(input.name),
            starting_balance: Set(starting),
            balance: Set(starting),
            is_default: Set(input.is_default),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let account = account.insert(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::AccountCreated,
            "account",
            Some(account.id),
            None,
            Some(snapshot(&account)),
        )
        .await?;

        txn.commit().await?;
        info!(account_id = %account.id, branch_id = %account.branch_id, "account created");
        Ok(account)
    }

    /// Lists accounts for a branch, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        branch_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<accounts::Model>, AccountError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::BranchId.eq(branch_id))
            .order_by_asc(accounts::Column::Name);
        if !include_inactive {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Finds an account by id within a branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist in the branch.
    pub async fn get(&self, branch_id: Uuid, id: Uuid) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(id)
            .filter(accounts::Column::BranchId.eq(branch_id))
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Renames an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing or the new name is
    /// already taken in the branch.
    pub async fn update(
        &self,
        branch_id: Uuid,
        id: Uuid,
        input: UpdateAccountInput,
        ctx: &AuditContext,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.get(branch_id, id).await?;
        let old = snapshot(&account);

        if let Some(new_name) = &input.name
            && *new_name != account.name
        {
            let clash = accounts::Entity::find()
                .filter(accounts::Column::BranchId.eq(branch_id))
                .filter(accounts::Column::Name.eq(new_name))
                .filter(accounts::Column::Id.ne(id))
                .one(&self.db)
                .await?;
            if clash.is_some() {
                return Err(AccountError::NameExists(new_name.clone()));
            }
        }

        let txn = self.db.begin().await?;
        let mut active: accounts::ActiveModel = account.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::AccountUpdated,
            "account",
            Some(updated.id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Makes an account the branch default, clearing the previous one
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist in the branch.
    pub async fn set_default(
        &self,
        branch_id: Uuid,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.get(branch_id, id).await?;
        if account.is_default {
            return Ok(account);
        }
        let old = snapshot(&account);

        let txn = self.db.begin().await?;
        Self::clear_default(&txn, branch_id).await?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_default = Set(true);
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::AccountUpdated,
            "account",
            Some(updated.id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Deactivates an account. The branch default is refused.
    ///
    /// # Errors
    ///
    /// Returns `DefaultNotDeactivatable` for the default account.
    pub async fn deactivate(
        &self,
        branch_id: Uuid,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), AccountError> {
        let account = self.get(branch_id, id).await?;
        if account.is_default {
            return Err(AccountError::DefaultNotDeactivatable);
        }
        let old = snapshot(&account);
        let account_id = account.id;

        let txn = self.db.begin().await?;
        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::AccountDeactivated,
            "account",
            Some(account_id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        info!(%account_id, "account deactivated");
        Ok(())
    }

    /// Hard-deletes an account that has no transaction history.
    ///
    /// The check runs before the foreign-key constraint could fire so
    /// the caller gets a validation error, not a constraint leak.
    ///
    /// # Errors
    ///
    /// Returns `HasTransactions` when any transaction references the
    /// account.
    pub async fn delete(
        &self,
        branch_id: Uuid,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), AccountError> {
        let account = self.get(branch_id, id).await?;

        let history = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(id))
            .count(&self.db)
            .await?;
        if history > 0 {
            return Err(AccountError::HasTransactions(history));
        }

        let old = snapshot(&account);
        let txn = self.db.begin().await?;
        accounts::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            ctx,
            AuditAction::AccountDeleted,
            "account",
            Some(id),
            Some(old),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Locks an account row with `SELECT ... FOR UPDATE` inside the
    /// given transaction. All balance writes must go through this.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub(crate) async fn lock_for_update(
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Applies a signed delta to a locked account's running balance.
    pub(crate) async fn apply_balance_delta(
        txn: &DatabaseTransaction,
        account: accounts::Model,
        delta: Decimal,
    ) -> Result<accounts::Model, DbErr> {
        let new_balance = account.balance + delta;
        let mut active: accounts::ActiveModel = account.into();
        active.balance = Set(new_balance);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(txn).await
    }

    async fn clear_default(txn: &DatabaseTransaction, branch_id: Uuid) -> Result<(), DbErr> {
        if let Some(current) = accounts::Entity::find()
            .filter(accounts::Column::BranchId.eq(branch_id))
            .filter(accounts::Column::IsDefault.eq(true))
            .one(txn)
            .await?
        {
            let mut active: accounts::ActiveModel = current.into();
            active.is_default = Set(false);
            active.updated_at = Set(chrono::Utc::now().into());
            active.update(txn).await?;
        }
        Ok(())
    }
}

fn snapshot(account: &accounts::Model) -> Snapshot {
    Snapshot::new()
        .field("name", account.name.as_str())
        .field("starting_balance", account.starting_balance.to_string())
        .field("balance", account.balance.to_string())
        .field("is_default", account.is_default)
        .field("is_active", account.is_active)
}
