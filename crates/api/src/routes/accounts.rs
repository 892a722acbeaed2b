//! Account management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{ApiResult, created_data, success_data, success_message};
use crate::routes::{effective_branch, parse_amount};
use crate::AppState;
use fiscus_core::access;
use fiscus_db::entities::accounts;
use fiscus_db::repositories::{CreateAccountInput, UpdateAccountInput};
use fiscus_db::AccountRepository;
use fiscus_shared::types::amount::format_amount;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts", post(create_account))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}", patch(update_account))
        .route("/accounts/{id}", delete(delete_account))
        .route("/accounts/{id}/default", post(set_default))
        .route("/accounts/{id}/deactivate", post(deactivate_account))
}

#[derive(Debug, Deserialize)]
struct BranchQuery {
    branch: Option<Uuid>,
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Debug, Deserialize)]
struct CreateAccountRequest {
    name: String,
    /// 2-decimal amount string.
    starting_balance: String,
    #[serde(default)]
    is_default: bool,
}

#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccountResponse {
    id: Uuid,
    name: String,
    starting_balance: String,
    balance: String,
    is_default: bool,
    is_active: bool,
    created_at: String,
}

impl From<accounts::Model> for AccountResponse {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            starting_balance: format_amount(model.starting_balance),
            balance: format_amount(model.balance),
            is_default: model.is_default,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/accounts` - list the branch's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    let accounts = repo.list(branch, query.include_inactive).await?;
    let items: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(success_data(items))
}

/// POST `/accounts` - create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BranchQuery>,
    Json(payload): Json<CreateAccountRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let starting_balance = parse_amount(&payload.starting_balance)?;

    let repo = AccountRepository::new((*state.db).clone());
    let account = repo
        .create(
            CreateAccountInput {
                branch_id: branch,
                name: payload.name,
                starting_balance,
                is_default: payload.is_default,
            },
            &auth.audit_context(),
        )
        .await?;
    Ok(created_data(AccountResponse::from(account)))
}

/// GET `/accounts/{id}` - fetch one account.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo.get(branch, id).await?;
    Ok(success_data(AccountResponse::from(account)))
}

/// PATCH `/accounts/{id}` - rename an account.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo
        .update(
            branch,
            id,
            UpdateAccountInput { name: payload.name },
            &auth.audit_context(),
        )
        .await?;
    Ok(success_data(AccountResponse::from(account)))
}

/// POST `/accounts/{id}/default` - make an account the branch default.
async fn set_default(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    repo.set_default(branch, id, &auth.audit_context()).await?;
    Ok(success_message("Default account updated"))
}

/// POST `/accounts/{id}/deactivate` - deactivate an account.
async fn deactivate_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    repo.deactivate(branch, id, &auth.audit_context()).await?;
    Ok(success_message("Account deactivated"))
}

/// DELETE `/accounts/{id}` - delete an account without history.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Response> {
    let actor = auth.actor();
    access::require_finance(&actor)?;
    let branch = effective_branch(&actor, query.branch)?;
    let repo = AccountRepository::new((*state.db).clone());
    repo.delete(branch, id, &auth.audit_context()).await?;
    Ok(success_message("Account deleted"))
}
