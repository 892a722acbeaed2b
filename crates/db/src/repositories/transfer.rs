//! Fund transfer manager.
//!
//! Transfers move earmarked money between two funds of one branch.
//! They never touch account balances; deleting a transfer simply
//! removes the row and the derived fund balances adjust on the next
//! read.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_shared::types::amount::round_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

use crate::entities::{fund_transfers, funds};
use crate::repositories::{audit, AuditContext};

/// Error types for fund transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Transfer not found in the branch.
    #[error("Fund transfer not found: {0}")]
    NotFound(Uuid),

    /// Source and destination funds are the same.
    #[error("Cannot transfer a fund to itself")]
    SameFund,

    /// Amount must be strictly positive.
    #[error("Transfer amount must be positive")]
    NonPositiveAmount,

    /// Fund missing, inactive, or in a different branch.
    #[error("Fund not found: {0}")]
    FundNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransferError> for fiscus_shared::AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NotFound(id) => Self::NotFound(format!("fund transfer {id}")),
            TransferError::SameFund | TransferError::NonPositiveAmount => {
                Self::Validation(err.to_string())
            }
            TransferError::FundNotFound(id) => Self::NotFound(format!("fund {id}")),
            TransferError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for recording a fund transfer.
#[derive(Debug, Clone)]
pub struct CreateTransferInput {
    /// Owning branch.
    pub branch_id: Uuid,
    /// Source fund.
    pub from_fund_id: Uuid,
    /// Destination fund.
    pub to_fund_id: Uuid,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Free-form description.
    pub description: String,
    /// The acting user.
    pub created_by: Option<Uuid>,
}

/// Fund transfer repository.
#[derive(Debug, Clone)]
pub struct FundTransferRepository {
    db: DatabaseConnection,
}

impl FundTransferRepository {
    /// Creates a new fund transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a transfer between two funds of the branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the funds coincide, the amount is not
    /// positive, either fund is missing or inactive in the branch, or
    /// the database fails.
    pub async fn transfer(
        &self,
        input: CreateTransferInput,
        ctx: &AuditContext,
    ) -> Result<fund_transfers::Model, TransferError> {
        if input.from_fund_id == input.to_fund_id {
            return Err(TransferError::SameFund);
        }
        if input.amount <= Decimal::ZERO {
            return Err(TransferError::NonPositiveAmount);
        }

        let from = self.active_fund(input.branch_id, input.from_fund_id).await?;
        let to = self.active_fund(input.branch_id, input.to_fund_id).await?;

        let txn = self.db.begin().await?;
        let transfer = fund_transfers::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(input.branch_id),
            from_fund_id: Set(from.id),
            to_fund_id: Set(to.id),
            amount: Set(round_amount(input.amount)),
            description: Set(input.description),
            created_by: Set(input.created_by),
            created_at: Set(chrono::Utc::now().into()),
        };
        let transfer = transfer.insert(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::FundTransferCreated,
            "fund_transfer",
            Some(transfer.id),
            None,
            Some(
                snapshot(&transfer)
                    .field("from_fund", from.name.as_str())
                    .field("to_fund", to.name.as_str()),
            ),
        )
        .await?;
        txn.commit().await?;
        info!(transfer_id = %transfer.id, "fund transfer recorded");
        Ok(transfer)
    }

    /// Removes a transfer. Derived balances adjust implicitly on the
    /// next read; there is no reversal step.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transfer does not exist in the branch.
    pub async fn delete_transfer(
        &self,
        branch_id: Uuid,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), TransferError> {
        let transfer = fund_transfers::Entity::find_by_id(id)
            .filter(fund_transfers::Column::BranchId.eq(branch_id))
            .one(&self.db)
            .await?
            .ok_or(TransferError::NotFound(id))?;

        let old = snapshot(&transfer);
        let txn = self.db.begin().await?;
        fund_transfers::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            ctx,
            AuditAction::FundTransferDeleted,
            "fund_transfer",
            Some(id),
            Some(old),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(transfer_id = %id, "fund transfer deleted");
        Ok(())
    }

    /// Lists the branch's transfers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        branch_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<fund_transfers::Model>, TransferError> {
        let query = fund_transfers::Entity::find()
            .filter(fund_transfers::Column::BranchId.eq(branch_id));
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(fund_transfers::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(PageResponse::new(items, total, page))
    }

    async fn active_fund(
        &self,
        branch_id: Uuid,
        fund_id: Uuid,
    ) -> Result<funds::Model, TransferError> {
        funds::Entity::find_by_id(fund_id)
            .filter(funds::Column::BranchId.eq(branch_id))
            .filter(funds::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(TransferError::FundNotFound(fund_id))
    }
}

fn snapshot(transfer: &fund_transfers::Model) -> Snapshot {
    Snapshot::new()
        .field("from_fund_id", transfer.from_fund_id.to_string())
        .field("to_fund_id", transfer.to_fund_id.to_string())
        .field("amount", transfer.amount.to_string())
        .field("description", transfer.description.as_str())
}
