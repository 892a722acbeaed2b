//! Audit actions and before/after snapshots.
//!
//! Every state-changing operation records exactly one audit entry
//! (claim approval records two: the transition and the generated
//! transaction). Entries are append-only; nothing in this codebase
//! updates or deletes one.

pub mod action;
pub mod snapshot;

pub use action::AuditAction;
pub use snapshot::{Snapshot, diff};
