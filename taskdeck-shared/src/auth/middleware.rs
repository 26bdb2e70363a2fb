/// Request authentication context
///
/// The API's auth layer resolves the bearer token into an [`AuthContext`] and
/// inserts it into the request extensions. Handlers receive it with
/// `Extension<AuthContext>`; nothing about the caller is stored globally.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskdeck_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {} (premium: {})", auth.user_id, auth.is_premium)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::session::SessionPrincipal;

/// Authenticated caller of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Session the bearer token belongs to
    pub session_id: Uuid,

    /// Premium flag at request time
    pub is_premium: bool,
}

impl AuthContext {
    /// Builds the context from a resolved session
    pub fn from_session(session_id: Uuid, principal: SessionPrincipal) -> Self {
        Self {
            user_id: principal.user_id,
            session_id,
            is_premium: principal.is_premium,
        }
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Session revoked or unknown
    #[error("Session is no longer active")]
    SessionRevoked,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates the bearer token of a request and returns `(user_id, session_id)`
///
/// The session still has to be checked against the database.
pub fn token_identity(headers: &HeaderMap, secret: &str) -> Result<(i64, Uuid), AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret)?;
    Ok((claims.sub, claims.sid))
}
