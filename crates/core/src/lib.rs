//! Core business logic for Fiscus.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain rules, state machines, and calculations
//! live here.
//!
//! # Modules
//!
//! - `ledger` - Income/expense balance effects and validation
//! - `fund` - Derived fund balance arithmetic
//! - `claim` - Reimbursement claim workflow state machine
//! - `audit` - Audit actions and before/after snapshots
//! - `access` - Branch/role authorization predicate

pub mod access;
pub mod audit;
pub mod claim;
pub mod fund;
pub mod ledger;
