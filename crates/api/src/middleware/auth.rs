//! Authentication middleware for protected routes.
//!
//! Identity issuance lives in an external collaborator; this layer
//! only verifies the bearer token and resolves the caller into an
//! `Actor` plus the audit attribution for the request.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use fiscus_core::access::{Actor, RoleScope};
use fiscus_db::AuditContext;
use fiscus_shared::{Claims, TokenError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Best-effort client IP from proxy headers.
fn client_ip(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
}

/// Authentication middleware that verifies bearer tokens.
///
/// On success the resolved claims and the client IP are stored in
/// request extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "code": "MISSING_TOKEN",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.tokens.verify(token) {
        Ok(claims) => {
            let ip = client_ip(&request);
            request.extensions_mut().insert(claims);
            request.extensions_mut().insert(ClientIp(ip));
            next.run(request).await
        }
        Err(e) => {
            let (code, message) = match e {
                TokenError::Expired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid or malformed token"),
            };
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "code": code,
                    "message": message
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Clone)]
struct ClientIp(Option<String>);

/// Extractor for the authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    ip: Option<String>,
}

impl AuthUser {
    /// The caller as an access-control actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.claims.user_id(),
            branch_id: self.claims.branch_id(),
            scope: RoleScope::parse(&self.claims.scope).unwrap_or(RoleScope::Branch),
            finance: self.claims.finance,
        }
    }

    /// Audit attribution for mutations issued by this request.
    #[must_use]
    pub fn audit_context(&self) -> AuditContext {
        AuditContext {
            actor: Some(self.claims.user_id()),
            ip: self.ip.clone(),
        }
    }

    /// The caller's branch.
    #[must_use]
    pub const fn branch_id(&self) -> uuid::Uuid {
        self.claims.branch_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().cloned();
        let ip = parts
            .extensions
            .get::<ClientIp>()
            .cloned()
            .and_then(|c| c.0);
        claims.map(|claims| Self { claims, ip }).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "code": "UNAUTHORIZED",
                    "message": "Authentication required"
                })),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
