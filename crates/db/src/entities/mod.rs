//! `SeaORM` entity definitions.

pub mod accounts;
pub mod audit_log;
pub mod branches;
pub mod categories;
pub mod claims;
pub mod fund_transfers;
pub mod funds;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
