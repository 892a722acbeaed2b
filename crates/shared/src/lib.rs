//! Shared types, errors, and configuration for Fiscus.
//!
//! This crate provides common types used across all other crates:
//! - Monetary amount helpers with decimal precision
//! - The application-wide error taxonomy
//! - Pagination types for list endpoints
//! - Resolved request identity (user, branch, role)
//! - Configuration management

pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use identity::{Claims, TokenError, TokenService};
