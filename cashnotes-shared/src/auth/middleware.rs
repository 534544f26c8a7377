/// Auth context and errors for the bearer-token gate
///
/// The API server's auth layer extracts the `Authorization: Bearer <token>`
/// header, validates the access token, resolves the subject to an existing
/// user, and inserts an [`AuthContext`] into the request extensions for
/// downstream handlers.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use cashnotes_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
/// ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::User;

/// Authenticated identity attached to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Username of the authenticated user
    pub username: String,

    /// Email of the authenticated user
    pub email: String,
}

impl AuthContext {
    /// Builds the context from a resolved user row
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Error type for the authentication gate
///
/// Everything except `DatabaseError` maps to a 401 response; the messages are
/// the human-readable text returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header on a protected route
    #[error("Authorization header missing. Please provide a token.")]
    MissingHeader,

    /// Header present but not in Bearer form
    #[error("Invalid token format. Must be \"Bearer <token>\".")]
    MalformedHeader,

    /// Signature/expiry/claim validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Verified token whose subject no longer resolves to a user
    #[error("User associated with token not found.")]
    UnknownUser,

    /// Store failure while resolving the subject
    #[error("Database error during user retrieval.")]
    DatabaseError(String),
}

/// Extracts the token from a bearer-scheme Authorization header value
///
/// # Errors
///
/// - `MissingHeader` when no header value is present
/// - `MalformedHeader` unless the value is exactly `Bearer <token>`
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;

    let mut parts = header.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_valid() {
        let token = bearer_token(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingHeader)));
    }

    #[test]
    fn test_bearer_token_malformed() {
        for header in ["abc.def.ghi", "Basic abc", "Bearer", "Bearer ", "Bearer a b"] {
            assert!(
                matches!(bearer_token(Some(header)), Err(AuthError::MalformedHeader)),
                "expected malformed for {header:?}"
            );
        }
    }
}
