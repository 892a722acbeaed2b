//! Fund management routes.
//!
//! Fund balances in responses are derived at read time; nothing here
//! writes a balance.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{ApiResult, created_data, success_data, success_message};
use crate::routes::effective_branch;
use crate::AppState;
use fiscus_core::access;
use fiscus_db::repositories::FundWithBalance;
use fiscus_db::FundRepository;
use fiscus_shared::types::amount::format_amount;

/// Creates the fund routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/funds", get(list_funds))
        .route("/funds", post(create_fund))
        .route("/funds/{id}", get(get_fund))
        .route("/funds/{id}", patch(update_fund))
        .route("/funds/{id}/deactivate", post(deactivate_fund))
}

#[derive(Debug, Deserialize)]
struct BranchQuery {
    branch: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct FundNameRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct FundResponse {
    id: Uuid,
    name: String,
    is_general: bool,
    is_active: bool,
    balance: String,
}

impl From<FundWithBalance> for FundResponse {
    fn from(value: FundWithBalance) -> Self {
        Self {
            id: value.fund.id,
            name: value.fund.name,
            is_general: value.fund.is_general,
            is_active: value.fund.is_active,
            balance: format_amount(value.balance),
        }
    }
}

/// GET `/funds` - list the branch's funds with derived balances,
/// General Fund first.
async fn list_funds(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundRepository::new((*state.db).clone());
    let funds = repo.list_with_balances(branch).await?;
    let items: Vec<FundResponse> = funds.into_iter().map(Into::into).collect();
    Ok(success_data(items))
}

/// POST `/funds` - create a fund.
async fn create_fund(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BranchQuery>,
    Json(payload): Json<FundNameRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundRepository::new((*state.db).clone());
    let fund = repo
        .create(branch, payload.name, &auth.audit_context())
        .await?;
    let balance = repo.balance(&fund).await?;
    Ok(created_data(FundResponse::from(FundWithBalance {
        fund,
        balance,
    })))
}

/// GET `/funds/{id}` - fetch one fund with its derived balance.
async fn get_fund(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundRepository::new((*state.db).clone());
    let fund = repo.get(branch, id).await?;
    let balance = repo.balance(&fund).await?;
    Ok(success_data(FundResponse::from(FundWithBalance {
        fund,
        balance,
    })))
}

/// PATCH `/funds/{id}` - rename a fund.
async fn update_fund(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
    Json(payload): Json<FundNameRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundRepository::new((*state.db).clone());
    repo.update(branch, id, payload.name, &auth.audit_context())
        .await?;
    Ok(success_message("Fund updated"))
}

/// POST `/funds/{id}/deactivate` - deactivate an unused fund.
async fn deactivate_fund(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundRepository::new((*state.db).clone());
    repo.deactivate(branch, id, &auth.audit_context()).await?;
    Ok(success_message("Fund deactivated"))
}
