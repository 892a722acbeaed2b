//! Resolved request identity.
//!
//! Identity issuance (login, password reset, sessions) is an external
//! collaborator; this module only verifies the token each request
//! carries and exposes the resolved (user, branch, role) triple.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token claims carrying the resolved identity for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Branch ID (current context).
    pub branch: Uuid,
    /// Role scope: "branch", "cross_branch", or "global".
    pub scope: String,
    /// Whether the user holds the finance role.
    pub finance: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, branch_id: Uuid, scope: &str, finance: bool, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            branch: branch_id,
            scope: scope.to_string(),
            finance,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the branch ID from claims.
    #[must_use]
    pub const fn branch_id(&self) -> Uuid {
        self.branch
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is invalid.
    #[error("invalid token")]
    Invalid,
}

/// Service for verifying identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl TokenService {
    /// Creates a new token service with the given secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs claims into a token. Used by tooling and tests; production
    /// tokens are issued by the identity collaborator with the same secret.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for expired tokens and
    /// `TokenError::Invalid` for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret")
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let svc = service();
        let user = Uuid::new_v4();
        let branch = Uuid::new_v4();
        let claims = Claims::new(user, branch, "branch", true, 900);

        let token = svc.sign(&claims).expect("sign");
        let verified = svc.verify(&token).expect("verify");

        assert_eq!(verified.user_id(), user);
        assert_eq!(verified.branch_id(), branch);
        assert_eq!(verified.scope, "branch");
        assert!(verified.finance);
    }

    #[test]
    fn test_verify_garbage_fails() {
        let svc = service();
        assert!(matches!(
            svc.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_verify_wrong_secret_fails() {
        let svc = service();
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), "global", false, 900);
        let token = svc.sign(&claims).expect("sign");

        let other = TokenService::new("different-secret");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), "branch", false, -120);
        let token = svc.sign(&claims).expect("sign");

        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }
}
