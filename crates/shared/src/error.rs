//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
///
/// Every operation error surfaced to a caller falls into one of these
/// categories. Module-level errors in the core and db crates convert
/// into `AppError` at the API boundary; internal diagnostics never
/// leak past it.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing input (non-positive amount, missing date, empty reason).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity absent or outside the caller's branch scope.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Insufficient role or branch mismatch.
    #[error("Access denied: {0}")]
    Permission(String),

    /// Operation invalid for the entity's current lifecycle state.
    #[error("Invalid state: {0}")]
    State(String),

    /// Upload or notification collaborator failure.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Permission(_) => 403,
            Self::State(_) => 422,
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Permission(_) => "PERMISSION_ERROR",
            Self::State(_) => "STATE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Permission(String::new()).status_code(), 403);
        assert_eq!(AppError::State(String::new()).status_code(), 422);
        assert_eq!(AppError::ExternalService(String::new()).status_code(), 502);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::Permission(String::new()).error_code(),
            "PERMISSION_ERROR"
        );
        assert_eq!(AppError::State(String::new()).error_code(), "STATE_ERROR");
        assert_eq!(
            AppError::ExternalService(String::new()).error_code(),
            "EXTERNAL_SERVICE_ERROR"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AppError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::NotFound("msg".into()).to_string(),
            "Not found: msg"
        );
        assert_eq!(
            AppError::Permission("msg".into()).to_string(),
            "Access denied: msg"
        );
        assert_eq!(
            AppError::State("msg".into()).to_string(),
            "Invalid state: msg"
        );
    }
}
