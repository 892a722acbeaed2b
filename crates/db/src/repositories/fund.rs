//! Fund balance deriver.
//!
//! Funds store nothing. A fund's balance is computed on demand from
//! SUM aggregates over transactions and fund transfers; the General
//! Fund additionally absorbs unallocated transactions and the starting
//! balances of the branch's active accounts. Because the balance is a
//! pure aggregation, fund reads never race with ledger writes.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use fiscus_core::audit::{action::AuditAction, snapshot::Snapshot};
use fiscus_core::fund::derive::{derive_balance, fund_ordering, FundActivity, GeneralFundExtras};
use fiscus_core::ledger::types::TransactionKind;

use crate::entities::{accounts, fund_transfers, funds, transactions};
use crate::repositories::{audit, transaction::kind_to_db, AuditContext};

/// The default name given to the lazily created General Fund.
const GENERAL_FUND_NAME: &str = "General Fund";

/// Error types for fund operations.
#[derive(Debug, thiserror::Error)]
pub enum FundError {
    /// Fund not found in the branch.
    #[error("Fund not found: {0}")]
    NotFound(Uuid),

    /// Fund name already exists in the branch.
    #[error("Fund name '{0}' already exists")]
    NameExists(String),

    /// The General Fund cannot be deactivated.
    #[error("The General Fund cannot be deactivated")]
    GeneralFundProtected,

    /// Funds with transactions or transfers cannot be deactivated.
    #[error("Cannot deactivate fund: {0} records reference it")]
    HasActivity(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FundError> for fiscus_shared::AppError {
    fn from(err: FundError) -> Self {
        match err {
            FundError::NotFound(id) => Self::NotFound(format!("fund {id}")),
            FundError::NameExists(_)
            | FundError::GeneralFundProtected
            | FundError::HasActivity(_) => Self::Validation(err.to_string()),
            FundError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A fund together with its derived balance.
#[derive(Debug, Clone)]
pub struct FundWithBalance {
    /// The fund record.
    pub fund: funds::Model,
    /// Balance derived at read time.
    pub balance: Decimal,
}

/// Fund repository.
#[derive(Debug, Clone)]
pub struct FundRepository {
    db: DatabaseConnection,
}

impl FundRepository {
    /// Creates a new fund repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the branch's General Fund, creating it on first access.
    /// Idempotent; the partial unique index keeps concurrent callers
    /// from creating two.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn ensure_general(&self, branch_id: Uuid) -> Result<funds::Model, FundError> {
        if let Some(general) = funds::Entity::find()
            .filter(funds::Column::BranchId.eq(branch_id))
            .filter(funds::Column::IsGeneral.eq(true))
            .one(&self.db)
            .await?
        {
            return Ok(general);
        }

        let now = chrono::Utc::now().into();
        let fund = funds::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(branch_id),
            name: Set(GENERAL_FUND_NAME.to_string()),
            is_general: Set(true),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let fund = fund.insert(&self.db).await?;
        info!(branch_id = %branch_id, fund_id = %fund.id, "general fund created");
        Ok(fund)
    }

    /// Creates a fund.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken in the branch.
    pub async fn create(
        &self,
        branch_id: Uuid,
        name: String,
        ctx: &AuditContext,
    ) -> Result<funds::Model, FundError> {
        let existing = funds::Entity::find()
            .filter(funds::Column::BranchId.eq(branch_id))
            .filter(funds::Column::Name.eq(&name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(FundError::NameExists(name));
        }

        let now = chrono::Utc::now().into();
        let txn = self.db.begin().await?;
        let fund = funds::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(branch_id),
            name: Set(name),
            is_general: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let fund = fund.insert(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::FundCreated,
            "fund",
            Some(fund.id),
            None,
            Some(snapshot(&fund)),
        )
        .await?;
        txn.commit().await?;
        Ok(fund)
    }

    /// Renames a fund.
    ///
    /// # Errors
    ///
    /// Returns an error if the fund is missing or the new name is
    /// taken in the branch.
    pub async fn update(
        &self,
        branch_id: Uuid,
        id: Uuid,
        name: String,
        ctx: &AuditContext,
    ) -> Result<funds::Model, FundError> {
        let fund = self.get(branch_id, id).await?;
        if name != fund.name {
            let clash = funds::Entity::find()
                .filter(funds::Column::BranchId.eq(branch_id))
                .filter(funds::Column::Name.eq(&name))
                .filter(funds::Column::Id.ne(id))
                .one(&self.db)
                .await?;
            if clash.is_some() {
                return Err(FundError::NameExists(name));
            }
        }
        let old = snapshot(&fund);

        let txn = self.db.begin().await?;
        let mut active: funds::ActiveModel = fund.into();
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::FundUpdated,
            "fund",
            Some(updated.id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Deactivates a fund. The General Fund is refused, as is any fund
    /// still referenced by transactions or transfers; the checks run
    /// before any constraint could fire.
    ///
    /// # Errors
    ///
    /// Returns `GeneralFundProtected` or `HasActivity` accordingly.
    pub async fn deactivate(
        &self,
        branch_id: Uuid,
        id: Uuid,
        ctx: &AuditContext,
    ) -> Result<(), FundError> {
        let fund = self.get(branch_id, id).await?;
        if fund.is_general {
            return Err(FundError::GeneralFundProtected);
        }

        let transaction_count = transactions::Entity::find()
            .filter(transactions::Column::FundId.eq(id))
            .count(&self.db)
            .await?;
        let transfer_count = fund_transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(fund_transfers::Column::FromFundId.eq(id))
                    .add(fund_transfers::Column::ToFundId.eq(id)),
            )
            .count(&self.db)
            .await?;
        let activity = transaction_count + transfer_count;
        if activity > 0 {
            return Err(FundError::HasActivity(activity));
        }

        let old = snapshot(&fund);
        let fund_id = fund.id;
        let txn = self.db.begin().await?;
        let mut active: funds::ActiveModel = fund.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        audit::record(
            &txn,
            ctx,
            AuditAction::FundDeactivated,
            "fund",
            Some(fund_id),
            Some(old),
            Some(snapshot(&updated)),
        )
        .await?;
        txn.commit().await?;
        info!(%fund_id, "fund deactivated");
        Ok(())
    }

    /// Finds a fund by id within a branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the fund does not exist in the branch.
    pub async fn get(&self, branch_id: Uuid, id: Uuid) -> Result<funds::Model, FundError> {
        funds::Entity::find_by_id(id)
            .filter(funds::Column::BranchId.eq(branch_id))
            .one(&self.db)
            .await?
            .ok_or(FundError::NotFound(id))
    }

    /// Derives a fund's balance from live aggregates.
    ///
    /// # Errors
    ///
    /// Returns an error if an aggregation query fails.
    pub async fn balance(&self, fund: &funds::Model) -> Result<Decimal, FundError> {
        let activity = FundActivity {
            income: self
                .sum_transactions(fund.branch_id, Some(fund.id), TransactionKind::Income)
                .await?,
            expense: self
                .sum_transactions(fund.branch_id, Some(fund.id), TransactionKind::Expense)
                .await?,
            transfers_in: self.sum_transfers_to(fund.id).await?,
            transfers_out: self.sum_transfers_from(fund.id).await?,
        };

        let extras = if fund.is_general {
            Some(GeneralFundExtras {
                unallocated_income: self
                    .sum_transactions(fund.branch_id, None, TransactionKind::Income)
                    .await?,
                unallocated_expense: self
                    .sum_transactions(fund.branch_id, None, TransactionKind::Expense)
                    .await?,
                starting_balances: self.sum_starting_balances(fund.branch_id).await?,
            })
        } else {
            None
        };

        Ok(derive_balance(activity, extras))
    }

    /// Lists the branch's active funds with derived balances, General
    /// Fund first, the rest alphabetically. Ensures the General Fund
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn list_with_balances(
        &self,
        branch_id: Uuid,
    ) -> Result<Vec<FundWithBalance>, FundError> {
        self.ensure_general(branch_id).await?;

        let mut all = funds::Entity::find()
            .filter(funds::Column::BranchId.eq(branch_id))
            .filter(funds::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        all.sort_by(|a, b| fund_ordering(a.is_general, &a.name, b.is_general, &b.name));

        let mut results = Vec::with_capacity(all.len());
        for fund in all {
            let balance = self.balance(&fund).await?;
            results.push(FundWithBalance { fund, balance });
        }
        Ok(results)
    }

    async fn sum_transactions(
        &self,
        branch_id: Uuid,
        fund_id: Option<Uuid>,
        kind: TransactionKind,
    ) -> Result<Decimal, FundError> {
        let mut query = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::BranchId.eq(branch_id))
            .filter(transactions::Column::Kind.eq(kind_to_db(kind)));
        query = match fund_id {
            Some(id) => query.filter(transactions::Column::FundId.eq(id)),
            None => query.filter(transactions::Column::FundId.is_null()),
        };
        let total: Option<Option<Decimal>> =
            query.into_tuple().one(&self.db).await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn sum_transfers_to(&self, fund_id: Uuid) -> Result<Decimal, FundError> {
        let total: Option<Option<Decimal>> = fund_transfers::Entity::find()
            .select_only()
            .column_as(fund_transfers::Column::Amount.sum(), "total")
            .filter(fund_transfers::Column::ToFundId.eq(fund_id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn sum_transfers_from(&self, fund_id: Uuid) -> Result<Decimal, FundError> {
        let total: Option<Option<Decimal>> = fund_transfers::Entity::find()
            .select_only()
            .column_as(fund_transfers::Column::Amount.sum(), "total")
            .filter(fund_transfers::Column::FromFundId.eq(fund_id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn sum_starting_balances(&self, branch_id: Uuid) -> Result<Decimal, FundError> {
        let total: Option<Option<Decimal>> = accounts::Entity::find()
            .select_only()
            .column_as(accounts::Column::StartingBalance.sum(), "total")
            .filter(accounts::Column::BranchId.eq(branch_id))
            .filter(accounts::Column::IsActive.eq(true))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}

fn snapshot(fund: &funds::Model) -> Snapshot {
    Snapshot::new()
        .field("name", fund.name.as_str())
        .field("is_general", fund.is_general)
        .field("is_active", fund.is_active)
}
