//! Transaction ledger manager.
//!
//! Every mutation here follows the same protocol: open one database
//! transaction, lock the affected account row(s) with
//! `SELECT ... FOR UPDATE`, move the running balance by the signed
//! effect of the change, write the row and its audit entry, commit.
//! Updates always reverse the old effect before applying the new one,
//! even when nothing that influences the balance changed; the protocol
//! is unconditional so it cannot drift out of sync with edge cases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use fiscus_core::access::{self, AccessError, Actor};
use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_core::ledger::{
    effect::{balance_effect, reversal_effect},
    error::LedgerError,
    types::{TransactionDraft, TransactionKind},
    validation::validate_draft,
};
use fiscus_shared::types::amount::round_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

use crate::entities::{accounts, categories, funds, sea_orm_active_enums, transactions};
use crate::repositories::{account::AccountError, audit, AccountRepository, AuditContext};

/// Error types for ledger transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found in the caller's scope.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Domain validation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Branch or role check failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Account-level failure (missing account, locked-row lookup).
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The account is inactive.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    /// The account belongs to a different branch than the transaction.
    #[error("Account belongs to a different branch")]
    AccountBranchMismatch,

    /// Category missing or inactive in the branch.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Category kind does not match the transaction kind.
    #[error("Category kind does not match transaction kind")]
    CategoryKindMismatch,

    /// Fund missing or inactive in the branch.
    #[error("Fund not found: {0}")]
    FundNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionError> for fiscus_shared::AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(id) => Self::NotFound(format!("transaction {id}")),
            TransactionError::Ledger(e) => e.into(),
            TransactionError::Access(e) => e.into(),
            TransactionError::Account(e) => e.into(),
            TransactionError::AccountInactive(_)
            | TransactionError::AccountBranchMismatch
            | TransactionError::CategoryKindMismatch => Self::Validation(err.to_string()),
            TransactionError::CategoryNotFound(id) => Self::NotFound(format!("category {id}")),
            TransactionError::FundNotFound(id) => Self::NotFound(format!("fund {id}")),
            TransactionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Income or expense.
    pub kind: TransactionKind,
    /// Calendar date the money moved.
    pub date: NaiveDate,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// The account the money moves through.
    pub account_id: Uuid,
    /// Category of the transaction.
    pub category_id: Uuid,
    /// Optional fund allocation; `None` lands in the General Fund.
    pub fund_id: Option<Uuid>,
    /// Free-form description.
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional receipt reference.
    pub receipt_ref: Option<String>,
}

/// Partial update for a transaction. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New kind.
    pub kind: Option<TransactionKind>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// Move to a different account.
    pub account_id: Option<Uuid>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New fund allocation (`Some(None)` clears it).
    pub fund_id: Option<Option<Uuid>>,
    /// New description.
    pub description: Option<String>,
    /// New external reference (`Some(None)` clears it).
    pub reference: Option<Option<String>>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    /// Branch scope (mandatory).
    pub branch_id: Uuid,
    /// Filter by kind.
    pub kind: Option<TransactionKind>,
    /// Filter by account.
    pub account_id: Option<Uuid>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by fund.
    pub fund_id: Option<Uuid>,
    /// Transactions on or after this date.
    pub from: Option<NaiveDate>,
    /// Transactions on or before this date.
    pub to: Option<NaiveDate>,
}

/// Ledger transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a transaction and moves the account balance by its
    /// effect, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the caller may not access
    /// the account's branch, any referenced entity is missing or
    /// inactive, or the database fails.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateTransactionInput,
        ctx: &AuditContext,
    ) -> Result<transactions::Model, TransactionError> {
        access::require_finance(actor)?;
        let draft = TransactionDraft {
            kind: input.kind,
            date: Some(input.date),
            amount: input.amount,
            account_id: Some(input.account_id),
            category_id: Some(input.category_id),
            fund_id: input.fund_id,
        };
        validate_draft(&draft)?;
        let amount = round_amount(input.amount);

        let txn = self.db.begin().await?;
        let account = AccountRepository::lock_for_update(&txn, input.account_id).await?;
        if !account.is_active {
            return Err(TransactionError::AccountInactive(account.id));
        }
        access::require_branch_access(actor, account.branch_id)?;
        Self::check_category(&txn, account.branch_id, input.category_id, input.kind).await?;
        if let Some(fund_id) = input.fund_id {
            Self::check_fund(&txn, account.branch_id, fund_id).await?;
        }

        let row = NewTransactionRow {
            branch_id: account.branch_id,
            kind: input.kind,
            date: input.date,
            amount,
            account_id: input.account_id,
            category_id: input.category_id,
            fund_id: input.fund_id,
            description: input.description,
            reference: input.reference,
            receipt_ref: input.receipt_ref,
            claim_id: None,
            created_by: Some(actor.user_id),
        };
        let created = Self::insert_in_txn(&txn, account, row, ctx).await?;
        txn.commit().await?;
        info!(transaction_id = %created.id, kind = %input.kind, "transaction created");
        Ok(created)
    }

    /// Updates a transaction with the reverse-then-apply protocol:
    /// the old effect is removed from the old account and the new
    /// effect applied to the target account, in one database
    /// transaction. When two accounts are involved they are locked in
    /// stable id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is missing, validation
    /// fails, or the database fails.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateTransactionInput,
        ctx: &AuditContext,
    ) -> Result<transactions::Model, TransactionError> {
        access::require_finance(actor)?;

        // The row is read under its own lock so the reversal below is
        // computed from the committed state, not a stale pre-read; a
        // concurrent mutation of the same transaction waits here.
        let txn = self.db.begin().await?;
        let existing = transactions::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;
        access::require_branch_access(actor, existing.branch_id)?;

        let old_kind = kind_from_db(&existing.kind);
        let new_kind = changes.kind.unwrap_or(old_kind);
        let new_amount = round_amount(changes.amount.unwrap_or(existing.amount));
        let new_account_id = changes.account_id.unwrap_or(existing.account_id);
        let new_category_id = changes.category_id.unwrap_or(existing.category_id);
        let new_fund_id = changes.fund_id.unwrap_or(existing.fund_id);
        let new_date = changes.date.unwrap_or(existing.transaction_date);

        let draft = TransactionDraft {
            kind: new_kind,
            date: Some(new_date),
            amount: new_amount,
            account_id: Some(new_account_id),
            category_id: Some(new_category_id),
            fund_id: new_fund_id,
        };
        validate_draft(&draft)?;

        let (old_account, new_account) =
            Self::lock_pair(&txn, existing.account_id, new_account_id).await?;
        if !new_account.is_active {
            return Err(TransactionError::AccountInactive(new_account.id));
        }
        if new_account.branch_id != existing.branch_id {
            return Err(TransactionError::AccountBranchMismatch);
        }
        Self::check_category(&txn, existing.branch_id, new_category_id, new_kind).await?;
        if let Some(fund_id) = new_fund_id {
            Self::check_fund(&txn, existing.branch_id, fund_id).await?;
        }

        // Reverse old, apply new. Unconditional, even if the account
        // and amount are unchanged.
        let reversal = reversal_effect(old_kind, existing.amount);
        let application = balance_effect(new_kind, new_amount);
        if old_account.id == new_account.id {
            AccountRepository::apply_balance_delta(&txn, old_account, reversal + application)
                .await?;
        } else {
            AccountRepository::apply_balance_delta(&txn, old_account, reversal).await?;
            AccountRepository::apply_balance_delta(&txn, new_account, application).await?;
        }

        let old_snapshot = snapshot(&existing);
        let mut active: transactions::ActiveModel = existing.into();
        active.kind = Set(kind_to_db(new_kind));
        active.transaction_date = Set(new_date);
        active.amount = Set(new_amount);
        active.account_id = Set(new_account_id);
        active.category_id = Set(new_category_id);
        active.fund_id = Set(new_fund_id);
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(reference) = changes.reference {
            active.reference = Set(reference);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::TransactionUpdated,
            "transaction",
            Some(updated.id),
            Some(old_snapshot),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        info!(transaction_id = %updated.id, "transaction updated");
        Ok(updated)
    }

    /// Deletes a transaction, reversing its balance effect. The
    /// account ends exactly where it would be had the transaction
    /// never existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is missing or the database
    /// fails.
    pub async fn delete(
        &self,
        actor: &Actor,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), TransactionError> {
        access::require_finance(actor)?;

        // Lock the row before computing the reversal; a concurrent
        // delete of the same transaction blocks here and then finds
        // the row gone instead of reversing the effect twice.
        let txn = self.db.begin().await?;
        let existing = transactions::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;
        access::require_branch_access(actor, existing.branch_id)?;

        let account = AccountRepository::lock_for_update(&txn, existing.account_id).await?;
        let reversal = reversal_effect(kind_from_db(&existing.kind), existing.amount);
        AccountRepository::apply_balance_delta(&txn, account, reversal).await?;

        let old_snapshot = snapshot(&existing);
        let deleted = transactions::Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(TransactionError::NotFound(id));
        }
        audit::record(
            &txn,
            ctx,
            AuditAction::TransactionDeleted,
            "transaction",
            Some(id),
            Some(old_snapshot),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(transaction_id = %id, "transaction deleted");
        Ok(())
    }

    /// Finds a transaction within the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing rows and a permission error for
    /// rows outside the caller's branch scope.
    pub async fn get(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<transactions::Model, TransactionError> {
        let found = transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;
        access::require_branch_access(actor, found.branch_id)?;
        Ok(found)
    }

    /// Lists transactions, newest first, with pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not access the branch or the
    /// database fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<transactions::Model>, TransactionError> {
        access::require_branch_access(actor, filter.branch_id)?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::BranchId.eq(filter.branch_id));
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind_to_db(kind)));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(fund_id) = filter.fund_id {
            query = query.filter(transactions::Column::FundId.eq(fund_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, total, page))
    }

    /// Inserts a transaction row, applies its balance effect to the
    /// already-locked account and writes the creation audit entry, all
    /// on the caller's open transaction. Claim approval uses this so
    /// the generated expense shares the approval's unit of work.
    pub(crate) async fn insert_in_txn(
        txn: &DatabaseTransaction,
        account: accounts::Model,
        row: NewTransactionRow,
        ctx: &AuditContext,
    ) -> Result<transactions::Model, TransactionError> {
        let now = chrono::Utc::now().into();
        let model = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(row.branch_id),
            kind: Set(kind_to_db(row.kind)),
            transaction_date: Set(row.date),
            amount: Set(row.amount),
            account_id: Set(row.account_id),
            category_id: Set(row.category_id),
            fund_id: Set(row.fund_id),
            description: Set(row.description),
            reference: Set(row.reference),
            receipt_ref: Set(row.receipt_ref),
            claim_id: Set(row.claim_id),
            created_by: Set(row.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(txn).await?;

        let effect = balance_effect(row.kind, created.amount);
        AccountRepository::apply_balance_delta(txn, account, effect).await?;

        audit::record(
            txn,
            ctx,
            AuditAction::TransactionCreated,
            "transaction",
            Some(created.id),
            None,
            Some(snapshot(&created)),
        )
        .await?;
        Ok(created)
    }

    /// Locks one or two account rows; two rows are locked in stable id
    /// order so concurrent updates cannot deadlock.
    async fn lock_pair(
        txn: &DatabaseTransaction,
        old_id: Uuid,
        new_id: Uuid,
    ) -> Result<(accounts::Model, accounts::Model), TransactionError> {
        if old_id == new_id {
            let account = AccountRepository::lock_for_update(txn, old_id).await?;
            return Ok((account.clone(), account));
        }
        let (first, second) = if old_id < new_id {
            (old_id, new_id)
        } else {
            (new_id, old_id)
        };
        let a = AccountRepository::lock_for_update(txn, first).await?;
        let b = AccountRepository::lock_for_update(txn, second).await?;
        if a.id == old_id {
            Ok((a, b))
        } else {
            Ok((b, a))
        }
    }

    async fn check_category(
        txn: &DatabaseTransaction,
        branch_id: Uuid,
        category_id: Uuid,
        kind: TransactionKind,
    ) -> Result<(), TransactionError> {
        let category = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::BranchId.eq(branch_id))
            .filter(categories::Column::IsActive.eq(true))
            .one(txn)
            .await?
            .ok_or(TransactionError::CategoryNotFound(category_id))?;
        if kind_from_db(&category.kind) != kind {
            return Err(TransactionError::CategoryKindMismatch);
        }
        Ok(())
    }

    async fn check_fund(
        txn: &DatabaseTransaction,
        branch_id: Uuid,
        fund_id: Uuid,
    ) -> Result<(), TransactionError> {
        funds::Entity::find_by_id(fund_id)
            .filter(funds::Column::BranchId.eq(branch_id))
            .filter(funds::Column::IsActive.eq(true))
            .one(txn)
            .await?
            .ok_or(TransactionError::FundNotFound(fund_id))?;
        Ok(())
    }
}

/// The fully resolved row an insert writes; built by `create` and by
/// claim approval.
#[derive(Debug, Clone)]
pub(crate) struct NewTransactionRow {
    pub branch_id: Uuid,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub fund_id: Option<Uuid>,
    pub description: String,
    pub reference: Option<String>,
    pub receipt_ref: Option<String>,
    pub claim_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

pub(crate) fn kind_to_db(kind: TransactionKind) -> sea_orm_active_enums::TransactionKind {
    match kind {
        TransactionKind::Income => sea_orm_active_enums::TransactionKind::Income,
        TransactionKind::Expense => sea_orm_active_enums::TransactionKind::Expense,
    }
}

pub(crate) fn kind_from_db(kind: &sea_orm_active_enums::TransactionKind) -> TransactionKind {
    match kind {
        sea_orm_active_enums::TransactionKind::Income => TransactionKind::Income,
        sea_orm_active_enums::TransactionKind::Expense => TransactionKind::Expense,
    }
}

pub(crate) fn snapshot(transaction: &transactions::Model) -> Snapshot {
    Snapshot::new()
        .field("kind", transaction.kind.to_value())
        .field("date", transaction.transaction_date.to_string())
        .field("amount", transaction.amount.to_string())
        .field("account_id", transaction.account_id.to_string())
        .field("category_id", transaction.category_id.to_string())
        .opt_field("fund_id", transaction.fund_id.map(|id| id.to_string()))
        .field("description", transaction.description.as_str())
        .opt_field("claim_id", transaction.claim_id.map(|id| id.to_string()))
}
