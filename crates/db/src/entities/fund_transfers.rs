//! `SeaORM` entity for the fund_transfers table.
//!
//! Transfers move earmarked money between funds of the same branch.
//! They never touch account balances.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fund_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    pub from_fund_id: Uuid,
    pub to_fund_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount: Decimal,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::funds::Entity",
        from = "Column::FromFundId",
        to = "super::funds::Column::Id"
    )]
    FromFund,
    #[sea_orm(
        belongs_to = "super::funds::Entity",
        from = "Column::ToFundId",
        to = "super::funds::Column::Id"
    )]
    ToFund,
}

impl ActiveModelBehavior for ActiveModel {}
