//! API route definitions.

use axum::{Router, middleware};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::response::ApiError;
use crate::{AppState, middleware::auth::auth_middleware};
use fiscus_core::access::{self, Actor};
use fiscus_shared::AppError;

pub mod accounts;
pub mod audit;
pub mod claims;
pub mod funds;
pub mod health;
pub mod transactions;
pub mod transfers;

/// Creates the API router: the health probe is public, everything else
/// sits behind the identity middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(funds::routes())
        .merge(transfers::routes())
        .merge(transactions::routes())
        .merge(claims::routes())
        .merge(audit::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Parses a 2-decimal amount string from a request body.
pub(crate) fn parse_amount(value: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(value)
        .map_err(|_| ApiError(AppError::Validation(format!("invalid amount '{value}'"))))
}

/// Resolves the branch a request operates on: the caller's own unless
/// an explicit branch was requested, which then must pass the access
/// predicate.
pub(crate) fn effective_branch(
    actor: &Actor,
    requested: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    let branch = requested.unwrap_or(actor.branch_id);
    access::require_branch_access(actor, branch)?;
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiscus_core::access::RoleScope;
    use rstest::rstest;

    fn actor(scope: RoleScope) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            scope,
            finance: false,
        }
    }

    #[rstest]
    #[case("100.00", true)]
    #[case("0.5", true)]
    #[case("-3", true)]
    #[case("abc", false)]
    #[case("1,000", false)]
    #[case("", false)]
    fn test_parse_amount(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(parse_amount(input).is_ok(), ok);
    }

    #[test]
    fn test_effective_branch_defaults_to_own() {
        let actor = actor(RoleScope::Branch);
        let resolved = effective_branch(&actor, None).unwrap();
        assert_eq!(resolved, actor.branch_id);
    }

    #[test]
    fn test_effective_branch_rejects_foreign_for_branch_scope() {
        let actor = actor(RoleScope::Branch);
        assert!(effective_branch(&actor, Some(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_effective_branch_allows_foreign_for_cross_branch_scope() {
        let actor = actor(RoleScope::CrossBranch);
        let other = Uuid::new_v4();
        assert_eq!(effective_branch(&actor, Some(other)).unwrap(), other);
    }
}
