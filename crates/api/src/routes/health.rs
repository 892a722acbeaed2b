//! Health check route.

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::AppState;

/// Creates the health routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET `/health` - liveness probe.
async fn health_check() -> impl IntoResponse {
    Json(json!({ "success": true, "data": { "status": "ok" } }))
}
