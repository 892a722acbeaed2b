//! Claims workflow repository.
//!
//! Claims move pending → approved or pending → rejected, once. The
//! approval path is the delicate one: the status transition, the
//! generated expense, the account balance move and both audit entries
//! all commit in one database transaction, with the claim and account
//! rows locked. A concurrent second approval re-reads the status under
//! the lock and fails with a state error, posting nothing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use fiscus_core::access::{self, AccessError, Actor};
use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_core::claim::{
    error::ClaimError as WorkflowError,
    types::{ClaimAction, ClaimStatus},
    workflow::ClaimWorkflow,
};
use fiscus_core::ledger::types::TransactionKind;
use fiscus_shared::types::amount::round_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

use crate::entities::{categories, claims, sea_orm_active_enums, transactions};
use crate::repositories::{
    account::AccountError,
    audit,
    transaction::{NewTransactionRow, TransactionError, TransactionRepository},
    AccountRepository, AuditContext,
};

/// Error types for claim storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ClaimStoreError {
    /// Claim not found in the caller's scope.
    #[error("Claim not found: {0}")]
    NotFound(Uuid),

    /// Workflow rule violated (bad transition, ownership, blank
    /// reason, missing receipt).
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Branch or role check failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Account-level failure during approval.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The chosen payout account is inactive.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    /// The chosen payout account belongs to a different branch.
    #[error("Account belongs to a different branch")]
    AccountBranchMismatch,

    /// Category missing or inactive in the branch.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// No expense category available for the approval: the branch has
    /// no claim category and the claim carries none of its own.
    #[error("No expense category available for this claim")]
    NoExpenseCategory,

    /// Failure while posting the generated expense.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClaimStoreError> for fiscus_shared::AppError {
    fn from(err: ClaimStoreError) -> Self {
        match err {
            ClaimStoreError::NotFound(id) => Self::NotFound(format!("claim {id}")),
            ClaimStoreError::Workflow(e) => e.into(),
            ClaimStoreError::Access(e) => e.into(),
            ClaimStoreError::Account(e) => e.into(),
            ClaimStoreError::Transaction(e) => e.into(),
            ClaimStoreError::AccountInactive(_)
            | ClaimStoreError::AccountBranchMismatch
            | ClaimStoreError::NoExpenseCategory => Self::Validation(err.to_string()),
            ClaimStoreError::CategoryNotFound(id) => Self::NotFound(format!("category {id}")),
            ClaimStoreError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for submitting a claim.
#[derive(Debug, Clone)]
pub struct SubmitClaimInput {
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Date on the receipt.
    pub receipt_date: NaiveDate,
    /// Optional category the submitter suggests.
    pub category_id: Option<Uuid>,
    /// What the expense was for.
    pub description: String,
    /// Reference to the uploaded receipt; submission is blocked
    /// without it.
    pub receipt_ref: String,
}

/// Partial update for a pending claim.
#[derive(Debug, Clone, Default)]
pub struct UpdateClaimInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New receipt date.
    pub receipt_date: Option<NaiveDate>,
    /// New category (`Some(None)` clears it).
    pub category_id: Option<Option<Uuid>>,
    /// New description.
    pub description: Option<String>,
    /// New receipt reference.
    pub receipt_ref: Option<String>,
}

/// Claim repository.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    db: DatabaseConnection,
}

impl ClaimRepository {
    /// Creates a new claim repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a claim in the pending state, owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, the receipt
    /// reference is blank, a supplied category is missing, or the
    /// database fails.
    pub async fn submit(
        &self,
        actor: &Actor,
        input: SubmitClaimInput,
        ctx: &AuditContext,
    ) -> Result<claims::Model, ClaimStoreError> {
        if input.amount <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveAmount.into());
        }
        if input.receipt_ref.trim().is_empty() {
            return Err(WorkflowError::ReceiptRequired.into());
        }
        if let Some(category_id) = input.category_id {
            self.check_category(actor.branch_id, category_id).await?;
        }

        let now = chrono::Utc::now().into();
        let txn = self.db.begin().await?;
        let claim = claims::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(actor.branch_id),
            submitted_by: Set(actor.user_id),
            amount: Set(round_amount(input.amount)),
            receipt_date: Set(input.receipt_date),
            category_id: Set(input.category_id),
            description: Set(input.description),
            receipt_ref: Set(input.receipt_ref),
            status: Set(sea_orm_active_enums::ClaimStatus::Pending),
            decided_by: Set(None),
            decided_at: Set(None),
            rejection_reason: Set(None),
            transaction_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let claim = claim.insert(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::ClaimSubmitted,
            "claim",
            Some(claim.id),
            None,
            Some(snapshot(&claim)),
        )
        .await?;
        txn.commit().await?;
        info!(claim_id = %claim.id, "claim submitted");
        Ok(claim)
    }

    /// Edits a pending claim. Only the submitter may edit, and only
    /// while the claim is pending.
    ///
    /// # Errors
    ///
    /// Returns workflow errors for terminal claims or foreign callers,
    /// validation errors for bad fields.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateClaimInput,
        ctx: &AuditContext,
    ) -> Result<claims::Model, ClaimStoreError> {
        let claim = self.load(actor, id).await?;
        if let Some(receipt_ref) = &changes.receipt_ref
            && receipt_ref.trim().is_empty()
        {
            return Err(WorkflowError::ReceiptRequired.into());
        }
        if let Some(Some(category_id)) = changes.category_id {
            self.check_category(claim.branch_id, category_id).await?;
        }

        let txn = self.db.begin().await?;
        let claim = claims::Entity::find_by_id(claim.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ClaimStoreError::NotFound(id))?;

        // Re-check under the lock; a decision racing this edit may
        // have moved the claim out of pending since the pre-read.
        ClaimWorkflow::ensure_editable(
            status_from_db(&claim.status),
            claim.submitted_by,
            actor.user_id,
        )?;

        let new_amount = round_amount(changes.amount.unwrap_or(claim.amount));
        if new_amount <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveAmount.into());
        }

        let old = snapshot(&claim);
        let mut active: claims::ActiveModel = claim.into();
        active.amount = Set(new_amount);
        if let Some(receipt_date) = changes.receipt_date {
            active.receipt_date = Set(receipt_date);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(receipt_ref) = changes.receipt_ref {
            active.receipt_ref = Set(receipt_ref);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::ClaimUpdated,
            "claim",
            Some(updated.id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Approves a pending claim and posts the reimbursement expense.
    ///
    /// In one database transaction: the claim and account rows are
    /// locked, the status re-checked under the lock, the claim moved
    /// to approved, the expense inserted dated at approval time with
    /// the claim back-reference, the account balance reduced, and two
    /// audit entries written. A second concurrent approval fails the
    /// under-lock re-check and posts nothing.
    ///
    /// # Errors
    ///
    /// Returns a workflow error unless the claim is pending, and
    /// validation errors for a missing, inactive or cross-branch
    /// account or an unresolvable expense category.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        account_id: Uuid,
        fund_id: Option<Uuid>,
        ctx: &AuditContext,
    ) -> Result<(claims::Model, transactions::Model), ClaimStoreError> {
        access::require_finance(actor)?;
        let claim = self.load(actor, id).await?;

        let txn = self.db.begin().await?;
        let claim = claims::Entity::find_by_id(claim.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ClaimStoreError::NotFound(id))?;

        // Re-check under the lock; the pre-read above may be stale.
        let action = ClaimWorkflow::approve(status_from_db(&claim.status), actor.user_id)?;
        let (decided_by, decided_at) = match &action {
            ClaimAction::Approve {
                decided_by,
                decided_at,
                ..
            } => (*decided_by, *decided_at),
            ClaimAction::Reject { .. } => unreachable!("approve never yields a reject action"),
        };

        let account = AccountRepository::lock_for_update(&txn, account_id).await?;
        if !account.is_active {
            return Err(ClaimStoreError::AccountInactive(account.id));
        }
        if account.branch_id != claim.branch_id {
            return Err(ClaimStoreError::AccountBranchMismatch);
        }

        let category_id = self.resolve_expense_category(&txn, &claim).await?;

        let row = NewTransactionRow {
            branch_id: claim.branch_id,
            kind: TransactionKind::Expense,
            // Dated at approval time, deliberately not the receipt date.
            date: decided_at.date_naive(),
            amount: claim.amount,
            account_id,
            category_id,
            fund_id,
            description: format!("Reimbursement: {}", claim.description),
            reference: None,
            receipt_ref: Some(claim.receipt_ref.clone()),
            claim_id: Some(claim.id),
            created_by: Some(decided_by),
        };
        let expense = TransactionRepository::insert_in_txn(&txn, account, row, ctx).await?;

        let old = snapshot(&claim);
        let mut active: claims::ActiveModel = claim.into();
        active.status = Set(status_to_db(action.new_status()));
        active.decided_by = Set(Some(decided_by));
        active.decided_at = Set(Some(decided_at.into()));
        active.transaction_id = Set(Some(expense.id));
        active.updated_at = Set(chrono::Utc::now().into());
        let approved = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::ClaimApproved,
            "claim",
            Some(approved.id),
            Some(old),
            Some(snapshot(&approved)),
        )
        .await?;
        txn.commit().await?;
        info!(claim_id = %approved.id, transaction_id = %expense.id, "claim approved");
        Ok((approved, expense))
    }

    /// Rejects a pending claim with a reason. No financial side
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns a workflow error unless the claim is pending, and a
    /// validation error for a blank reason.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: String,
        ctx: &AuditContext,
    ) -> Result<claims::Model, ClaimStoreError> {
        access::require_finance(actor)?;
        let claim = self.load(actor, id).await?;

        let txn = self.db.begin().await?;
        let claim = claims::Entity::find_by_id(claim.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ClaimStoreError::NotFound(id))?;

        let action = ClaimWorkflow::reject(status_from_db(&claim.status), actor.user_id, reason)?;
        let (decided_by, decided_at, reason) = match action {
            ClaimAction::Reject {
                decided_by,
                decided_at,
                reason,
                ..
            } => (decided_by, decided_at, reason),
            ClaimAction::Approve { .. } => unreachable!("reject never yields an approve action"),
        };

        let old = snapshot(&claim);
        let mut active: claims::ActiveModel = claim.into();
        active.status = Set(status_to_db(ClaimStatus::Rejected));
        active.decided_by = Set(Some(decided_by));
        active.decided_at = Set(Some(decided_at.into()));
        active.rejection_reason = Set(Some(reason));
        active.updated_at = Set(chrono::Utc::now().into());
        let rejected = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::ClaimRejected,
            "claim",
            Some(rejected.id),
            Some(old),
            Some(snapshot(&rejected)),
        )
        .await?;
        txn.commit().await?;
        info!(claim_id = %rejected.id, "claim rejected");
        Ok(rejected)
    }

    /// Deletes a pending claim. Only the submitter may delete, and
    /// only while the claim is pending; there is no balance effect.
    ///
    /// # Errors
    ///
    /// Returns workflow errors for terminal claims or foreign callers.
    pub async fn delete(
        &self,
        actor: &Actor,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), ClaimStoreError> {
        self.load(actor, id).await?;

        let txn = self.db.begin().await?;
        let claim = claims::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ClaimStoreError::NotFound(id))?;

        // Re-check under the lock; an approval racing this withdrawal
        // must win, leaving the claim and its expense intact.
        ClaimWorkflow::ensure_deletable(
            status_from_db(&claim.status),
            claim.submitted_by,
            actor.user_id,
        )?;

        let old = snapshot(&claim);
        claims::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            ctx,
            AuditAction::ClaimDeleted,
            "claim",
            Some(id),
            Some(old),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(claim_id = %id, "claim deleted");
        Ok(())
    }

    /// Finds a claim within the caller's scope. Submitters see their
    /// own claims; finance users see the branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a permission error.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<claims::Model, ClaimStoreError> {
        self.load(actor, id).await
    }

    /// Lists claims, newest first. Non-finance callers only see their
    /// own submissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not access the branch or the
    /// database fails.
    pub async fn list(
        &self,
        actor: &Actor,
        branch_id: Uuid,
        status: Option<ClaimStatus>,
        page: PageRequest,
    ) -> Result<PageResponse<claims::Model>, ClaimStoreError> {
        access::require_branch_access(actor, branch_id)?;

        let mut query = claims::Entity::find().filter(claims::Column::BranchId.eq(branch_id));
        if !actor.finance {
            query = query.filter(claims::Column::SubmittedBy.eq(actor.user_id));
        }
        if let Some(status) = status {
            query = query.filter(claims::Column::Status.eq(status_to_db(status)));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(claims::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(PageResponse::new(items, total, page))
    }

    async fn load(&self, actor: &Actor, id: Uuid) -> Result<claims::Model, ClaimStoreError> {
        let claim = claims::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ClaimStoreError::NotFound(id))?;
        access::require_branch_access(actor, claim.branch_id)?;
        if claim.submitted_by != actor.user_id {
            access::require_finance(actor)?;
        }
        Ok(claim)
    }

    /// Resolves the category for an approval-generated expense: the
    /// branch's designated claim category, falling back to the claim's
    /// own category.
    async fn resolve_expense_category(
        &self,
        txn: &DatabaseTransaction,
        claim: &claims::Model,
    ) -> Result<Uuid, ClaimStoreError> {
        let designated = categories::Entity::find()
            .filter(categories::Column::BranchId.eq(claim.branch_id))
            .filter(categories::Column::IsClaimCategory.eq(true))
            .filter(categories::Column::IsActive.eq(true))
            .one(txn)
            .await?;
        if let Some(category) = designated {
            return Ok(category.id);
        }
        match claim.category_id {
            Some(own) => {
                warn!(
                    claim_id = %claim.id,
                    category_id = %own,
                    "no claim category configured; using the claim's own category"
                );
                Ok(own)
            }
            None => Err(ClaimStoreError::NoExpenseCategory),
        }
    }

    async fn check_category(
        &self,
        branch_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), ClaimStoreError> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::BranchId.eq(branch_id))
            .filter(categories::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(ClaimStoreError::CategoryNotFound(category_id))?;
        Ok(())
    }
}

pub(crate) fn status_to_db(status: ClaimStatus) -> sea_orm_active_enums::ClaimStatus {
    match status {
        ClaimStatus::Pending => sea_orm_active_enums::ClaimStatus::Pending,
        ClaimStatus::Approved => sea_orm_active_enums::ClaimStatus::Approved,
        ClaimStatus::Rejected => sea_orm_active_enums::ClaimStatus::Rejected,
    }
}

pub(crate) fn status_from_db(status: &sea_orm_active_enums::ClaimStatus) -> ClaimStatus {
    match status {
        sea_orm_active_enums::ClaimStatus::Pending => ClaimStatus::Pending,
        sea_orm_active_enums::ClaimStatus::Approved => ClaimStatus::Approved,
        sea_orm_active_enums::ClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn snapshot(claim: &claims::Model) -> Snapshot {
    Snapshot::new()
        .field("amount", claim.amount.to_string())
        .field("receipt_date", claim.receipt_date.to_string())
        .opt_field("category_id", claim.category_id.map(|id| id.to_string()))
        .field("description", claim.description.as_str())
        .field("receipt_ref", claim.receipt_ref.as_str())
        .field("status", claim.status.to_value())
        .opt_field("decided_by", claim.decided_by.map(|id| id.to_string()))
        .opt_field("rejection_reason", claim.rejection_reason.clone())
        .opt_field(
            "transaction_id",
            claim.transaction_id.map(|id| id.to_string()),
        )
}
