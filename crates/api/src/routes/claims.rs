//! Reimbursement claim routes.
//!
//! Submission and editing are open to every branch member; decisions
//! belong to finance users. Approval returns both the decided claim
//! and the expense it generated.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, patch, post},
};
use chrono::NaiveDate;
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created_data, success_data, success_message};
use crate::routes::{effective_branch, parse_amount};
use crate::AppState;
use fiscus_core::claim::types::ClaimStatus;
use fiscus_db::entities::claims;
use fiscus_db::repositories::{SubmitClaimInput, UpdateClaimInput};
use fiscus_db::ClaimRepository;
use fiscus_shared::types::amount::format_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};
use fiscus_shared::AppError;

/// Creates the claim routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(list_claims))
        .route("/claims", post(submit_claim))
        .route("/claims/{id}", get(get_claim))
        .route("/claims/{id}", patch(update_claim))
        .route("/claims/{id}", delete(delete_claim))
        .route("/claims/{id}/approve", post(approve_claim))
        .route("/claims/{id}/reject", post(reject_claim))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    branch: Option<Uuid>,
    /// `pending`, `approved` or `rejected`.
    status: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SubmitClaimRequest {
    /// 2-decimal amount string.
    amount: String,
    receipt_date: NaiveDate,
    category_id: Option<Uuid>,
    description: String,
    receipt_ref: String,
}

#[derive(Debug, Deserialize)]
struct UpdateClaimRequest {
    amount: Option<String>,
    receipt_date: Option<NaiveDate>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    category_id: Option<Option<Uuid>>,
    description: Option<String>,
    receipt_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApproveClaimRequest {
    /// The account the reimbursement is paid from.
    account_id: Uuid,
    /// Optional fund the expense is allocated to.
    fund_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct RejectClaimRequest {
    reason: String,
}

#[derive(Debug, Serialize)]
struct ClaimResponse {
    id: Uuid,
    submitted_by: Uuid,
    amount: String,
    receipt_date: NaiveDate,
    category_id: Option<Uuid>,
    description: String,
    receipt_ref: String,
    status: String,
    decided_by: Option<Uuid>,
    decided_at: Option<String>,
    rejection_reason: Option<String>,
    transaction_id: Option<Uuid>,
    created_at: String,
}

impl From<claims::Model> for ClaimResponse {
    fn from(model: claims::Model) -> Self {
        Self {
            id: model.id,
            submitted_by: model.submitted_by,
            amount: format_amount(model.amount),
            receipt_date: model.receipt_date,
            category_id: model.category_id,
            description: model.description,
            receipt_ref: model.receipt_ref,
            status: model.status.to_value(),
            decided_by: model.decided_by,
            decided_at: model.decided_at.map(|t| t.to_rfc3339()),
            rejection_reason: model.rejection_reason,
            transaction_id: model.transaction_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApprovalResponse {
    claim: ClaimResponse,
    transaction: super::transactions::TransactionResponse,
}

fn parse_status(value: &str) -> Result<ClaimStatus, ApiError> {
    ClaimStatus::parse(value).ok_or_else(|| {
        ApiError(AppError::Validation(format!(
            "invalid claim status '{value}'"
        )))
    })
}

/// GET `/claims` - list claims, newest first. Non-finance callers see
/// only their own submissions.
async fn list_claims(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        limit: query.limit.unwrap_or(defaults.limit),
    };

    let repo = ClaimRepository::new((*state.db).clone());
    let result = repo.list(&actor, branch, status, page).await?;
    let mapped = PageResponse {
        items: result.items.into_iter().map(ClaimResponse::from).collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    };
    Ok(success_data(mapped))
}

/// POST `/claims` - submit a reimbursement claim.
async fn submit_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SubmitClaimRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let amount = parse_amount(&payload.amount)?;

    let repo = ClaimRepository::new((*state.db).clone());
    let claim = repo
        .submit(
            &actor,
            SubmitClaimInput {
                amount,
                receipt_date: payload.receipt_date,
                category_id: payload.category_id,
                description: payload.description,
                receipt_ref: payload.receipt_ref,
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(created_data(ClaimResponse::from(claim)))
}

/// GET `/claims/{id}` - fetch one claim.
async fn get_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = ClaimRepository::new((*state.db).clone());
    let claim = repo.get(&actor, id).await?;
    Ok(success_data(ClaimResponse::from(claim)))
}

/// PATCH `/claims/{id}` - edit a pending claim (submitter only).
async fn update_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClaimRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let amount = payload
        .amount
        .as_deref()
        .map(parse_amount)
        .transpose()?;

    let repo = ClaimRepository::new((*state.db).clone());
    let claim = repo
        .update(
            &actor,
            id,
            UpdateClaimInput {
                amount,
                receipt_date: payload.receipt_date,
                category_id: payload.category_id,
                description: payload.description,
                receipt_ref: payload.receipt_ref,
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(success_data(ClaimResponse::from(claim)))
}

/// DELETE `/claims/{id}` - withdraw a pending claim (submitter only).
async fn delete_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = ClaimRepository::new((*state.db).clone());
    repo.delete(&actor, id, &auth.audit_context()).await?;
    Ok(success_message("Claim deleted"))
}

/// POST `/claims/{id}/approve` - approve a pending claim and post the
/// reimbursement expense from the chosen account.
async fn approve_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveClaimRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = ClaimRepository::new((*state.db).clone());
    let (claim, transaction) = repo
        .approve(
            &actor,
            id,
            payload.account_id,
            payload.fund_id,
            &auth.audit_context(),
        )
        .await?;
    Ok(success_data(ApprovalResponse {
        claim: ClaimResponse::from(claim),
        transaction: transaction.into(),
    }))
}

/// POST `/claims/{id}/reject` - reject a pending claim with a reason.
async fn reject_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectClaimRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = ClaimRepository::new((*state.db).clone());
    let claim = repo
        .reject(&actor, id, payload.reason, &auth.audit_context())
        .await?;
    Ok(success_data(ClaimResponse::from(claim)))
}
