//! Fund transfer routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{ApiResult, created_data, success_data, success_message};
use crate::routes::{effective_branch, parse_amount};
use crate::AppState;
use fiscus_core::access;
use fiscus_db::entities::fund_transfers;
use fiscus_db::repositories::CreateTransferInput;
use fiscus_db::FundTransferRepository;
use fiscus_shared::types::amount::format_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};

/// Creates the fund transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fund-transfers", get(list_transfers))
        .route("/fund-transfers", post(create_transfer))
        .route("/fund-transfers/{id}", delete(delete_transfer))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    branch: Option<Uuid>,
    page: Option<u64>,
    limit: Option<u64>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BranchQuery {
    branch: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct CreateTransferRequest {
    from_fund_id: Uuid,
    to_fund_id: Uuid,
    /// 2-decimal amount string.
    amount: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct TransferResponse {
    id: Uuid,
    from_fund_id: Uuid,
    to_fund_id: Uuid,
    amount: String,
    description: String,
    created_by: Option<Uuid>,
    created_at: String,
}

impl From<fund_transfers::Model> for TransferResponse {
    fn from(model: fund_transfers::Model) -> Self {
        Self {
            id: model.id,
            from_fund_id: model.from_fund_id,
            to_fund_id: model.to_fund_id,
            amount: format_amount(model.amount),
            description: model.description,
            created_by: model.created_by,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/fund-transfers` - list the branch's transfers, newest first.
async fn list_transfers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundTransferRepository::new((*state.db).clone());
    let page = repo.list(branch, query.page_request()).await?;
    let mapped = PageResponse {
        items: page.items.into_iter().map(TransferResponse::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    };
    Ok(success_data(mapped))
}

/// POST `/fund-transfers` - move earmarked money between two funds.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BranchQuery>,
    Json(payload): Json<CreateTransferRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let amount = parse_amount(&payload.amount)?;

    let repo = FundTransferRepository::new((*state.db).clone());
    let transfer = repo
        .transfer(
            CreateTransferInput {
                branch_id: branch,
                from_fund_id: payload.from_fund_id,
                to_fund_id: payload.to_fund_id,
                amount,
                description: payload.description,
                created_by: Some(actor.user_id),
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(created_data(TransferResponse::from(transfer)))
}

/// DELETE `/fund-transfers/{id}` - remove a transfer; derived fund
/// balances adjust on the next read.
async fn delete_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = FundTransferRepository::new((*state.db).clone());
    repo.delete_transfer(branch, id, &auth.audit_context())
        .await?;
    Ok(success_message("Fund transfer deleted"))
}
