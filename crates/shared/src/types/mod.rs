//! Common types used across the application.

pub mod amount;
pub mod pagination;

pub use amount::{format_amount, round_amount};
pub use pagination::{PageRequest, PageResponse};
