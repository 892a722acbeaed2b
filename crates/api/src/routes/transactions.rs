//! Ledger transaction routes.

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
use fiscus_core::ledger::types::TransactionKind;
use fiscus_db::entities::transactions;
use fiscus_db::repositories::{
    CreateTransactionInput, TransactionFilter, UpdateTransactionInput,
};
use fiscus_db::TransactionRepository;
use fiscus_shared::types::amount::format_amount;
use fiscus_shared::types::pagination::{PageRequest, PageResponse};
use fiscus_shared::AppError;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions", post(create_transaction))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}", patch(update_transaction))
        .route("/transactions/{id}", delete(delete_transaction))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    branch: Option<Uuid>,
    kind: Option<String>,
    account: Option<Uuid>,
    category: Option<Uuid>,
    fund: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateTransactionRequest {
    /// `income` or `expense`.
    kind: String,
    date: NaiveDate,
    /// 2-decimal amount string.
    amount: String,
    account_id: Uuid,
    category_id: Uuid,
    fund_id: Option<Uuid>,
    description: String,
    reference: Option<String>,
    receipt_ref: Option<String>,
}

/// Absent fields keep their value; `fund_id` and `reference` use a
/// double option so `null` clears them.
#[derive(Debug, Deserialize)]
struct UpdateTransactionRequest {
    kind: Option<String>,
    date: Option<NaiveDate>,
    amount: Option<String>,
    account_id: Option<Uuid>,
    category_id: Option<Uuid>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    fund_id: Option<Option<Uuid>>,
    description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    reference: Option<Option<String>>,
}

/// Wire shape of a transaction; claim approval reuses it for the
/// generated expense.
#[derive(Debug, Serialize)]
pub(crate) struct TransactionResponse {
    id: Uuid,
    kind: String,
    date: NaiveDate,
    amount: String,
    account_id: Uuid,
    category_id: Uuid,
    fund_id: Option<Uuid>,
    description: String,
    reference: Option<String>,
    receipt_ref: Option<String>,
    claim_id: Option<Uuid>,
    created_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind.to_value(),
            date: model.transaction_date,
            amount: format_amount(model.amount),
            account_id: model.account_id,
            category_id: model.category_id,
            fund_id: model.fund_id,
            description: model.description,
            reference: model.reference,
            receipt_ref: model.receipt_ref,
            claim_id: model.claim_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

fn parse_kind(value: &str) -> Result<TransactionKind, ApiError> {
    TransactionKind::parse(value).ok_or_else(|| {
        ApiError(AppError::Validation(format!(
            "invalid transaction kind '{value}'"
        )))
    })
}

/// GET `/transactions` - list transactions with filters, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        limit: query.limit.unwrap_or(defaults.limit),
    };
    let filter = TransactionFilter {
        branch_id: branch,
        kind,
        account_id: query.account,
        category_id: query.category,
        fund_id: query.fund,
        from: query.from,
        to: query.to,
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let result = repo.list(&actor, filter, page).await?;
    let mapped = PageResponse {
        items: result
            .items
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    };
    Ok(success_data(mapped))
}

/// POST `/transactions` - record an income or expense.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let kind = parse_kind(&payload.kind)?;
    let amount = parse_amount(&payload.amount)?;

    let repo = TransactionRepository::new((*state.db).clone());
    let created = repo
        .create(
            &actor,
            CreateTransactionInput {
                kind,
                date: payload.date,
                amount,
                account_id: payload.account_id,
                category_id: payload.category_id,
                fund_id: payload.fund_id,
                description: payload.description,
                reference: payload.reference,
                receipt_ref: payload.receipt_ref,
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(created_data(TransactionResponse::from(created)))
}

/// GET `/transactions/{id}` - fetch one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = TransactionRepository::new((*state.db).clone());
    let found = repo.get(&actor, id).await?;
    Ok(success_data(TransactionResponse::from(found)))
}

/// PATCH `/transactions/{id}` - edit a transaction; the old balance
/// effect is reversed and the new one applied atomically.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let kind = payload.kind.as_deref().map(parse_kind).transpose()?;
    let amount = payload
        .amount
        .as_deref()
        .map(parse_amount)
        .transpose()?;

    let repo = TransactionRepository::new((*state.db).clone());
    let updated = repo
        .update(
            &actor,
            id,
            UpdateTransactionInput {
                kind,
                date: payload.date,
                amount,
                account_id: payload.account_id,
                category_id: payload.category_id,
                fund_id: payload.fund_id,
                description: payload.description,
                reference: payload.reference,
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(success_data(TransactionResponse::from(updated)))
}

/// DELETE `/transactions/{id}` - delete a transaction, restoring the
/// account balance.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let repo = TransactionRepository::new((*state.db).clone());
    repo.delete(&actor, id, &auth.audit_context()).await?;
    Ok(success_message("Transaction deleted"))
}
