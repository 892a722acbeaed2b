//! The uniform response envelope.
//!
//! Commands answer `{"success": true, "message": ...}`, reads answer
//! `{"success": true, "data": ...}`, and every error becomes
//! `{"success": false, "message": ...}` with the taxonomy status code.
//! Server-side failures are logged and answered with a generic
//! message; internal diagnostics never leak to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use fiscus_shared::AppError;

/// Result alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An `AppError` carried to the response boundary.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(json!({
                "success": false,
                "code": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Envelope for a successful read.
pub fn success_data(data: impl Serialize) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

/// Envelope for a successful command.
pub fn success_message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// Envelope for a creation, with the created resource attached.
pub fn created_data(data: impl Serialize) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_keeps_its_message() {
        let response = ApiError(AppError::Validation("amount must be positive".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation error: amount must be positive");
    }

    #[tokio::test]
    async fn database_error_is_masked() {
        let response =
            ApiError(AppError::Database("connection refused at 10.0.0.3".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn state_error_maps_to_422() {
        let response = ApiError(AppError::State("claim is not pending".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn success_envelopes_have_the_expected_shape() {
        let body = body_json(success_data(serde_json::json!({"id": 1}))).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);

        let body = body_json(success_message("Transaction created")).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Transaction created");
    }
}
