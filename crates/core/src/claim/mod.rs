//! Reimbursement claim workflow.
//!
//! Claims start pending and move exactly once to approved or rejected;
//! both are terminal. Approval is the only transition with a financial
//! side effect: it posts an expense transaction dated at approval time.

pub mod error;
pub mod types;
pub mod workflow;

pub use error::ClaimError;
pub use types::{ClaimAction, ClaimStatus};
pub use workflow::ClaimWorkflow;
