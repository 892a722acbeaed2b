//! Audit trail routes. Read-only.

use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{ApiResult, success_data};
use crate::AppState;
use fiscus_core::access;
use fiscus_db::entities::audit_log;
use fiscus_db::repositories::AuditFilter;
use fiscus_db::AuditLogRepository;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit-log", get(list_entries))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    actor: Option<Uuid>,
    action: Option<String>,
    entity_type: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
struct AuditEntryResponse {
    id: Uuid,
    actor_id: Option<Uuid>,
    action: String,
    entity_type: String,
    entity_id: Option<Uuid>,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    ip_address: Option<String>,
    created_at: String,
}

impl From<audit_log::Model> for AuditEntryResponse {
    fn from(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            actor_id: model.actor_id,
            action: model.action,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            old_values: model.old_values,
            new_values: model.new_values,
            ip_address: model.ip_address,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/audit-log` - list audit entries, newest first. Finance only.
async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        limit: query.limit.unwrap_or(defaults.limit),
    };
    let filter = AuditFilter {
        actor_id: query.actor,
        action: query.action,
        entity_type: query.entity_type,
        from: query.from,
        to: query.to,
    };

    let repo = AuditLogRepository::new((*state.db).clone());
    let result = repo.list(filter, page).await?;
    let mapped = PageResponse {
        items: result
            .items
            .into_iter()
            .map(AuditEntryResponse::from)
            .collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    };
    Ok(success_data(mapped))
}
