/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Access-token refresh
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a new user
/// - `POST /auth/login` - Login and get tokens
/// - `GET|POST /auth/refreshToken` - Exchange a refresh token for a new
///   access token
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use cashnotes_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        password,
    },
    models::user::{validate_email_shape, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login name, at most 50 characters
    #[validate(length(max = 50, message = "Username max 50 character."))]
    pub username: String,

    /// Email address (basic local@domain.tld shape, at most 255 characters)
    #[validate(
        length(max = 255, message = "Email max 255 character."),
        custom(function = validate_email_shape, message = "The email format is wrong.")
    )]
    pub email: String,

    /// Password, 8 to 15 characters
    #[validate(length(
        min = 8,
        max = 15,
        message = "Password should have minimum 8 character or maximum 15 character."
    ))]
    pub password: String,

    /// Must match `password`
    #[validate(must_match(
        other = "password",
        message = "Password and Confirm Password didn't match."
    ))]
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token previously issued at registration or login
    pub refresh_token: String,
}

/// Public view of a user (no hash, no tokens)
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl UserPublic {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Tokens issued at registration and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub user: UserPublic,
    pub access_token: String,
    pub refresh_token: String,
}

/// New access token issued by the refresh endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedAccess {
    pub access_token: String,
}

/// Issues an access + refresh token pair and stores the refresh token
///
/// The stored refresh token is overwritten on every call (rotation).
async fn issue_tokens(state: &AppState, user: &User) -> ApiResult<(String, String)> {
    let access =
        jwt::create_token(&Claims::new(user.id, TokenType::Access), state.jwt_secret())?;
    let refresh =
        jwt::create_token(&Claims::new(user.id, TokenType::Refresh), state.jwt_secret())?;

    User::set_refresh_token(&state.db, user.id, &refresh).await?;

    Ok((access, refresh))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "username": "jane",
///   "email": "jane@example.com",
///   "password": "secret123",
///   "confirmPassword": "secret123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email already registered, or validation failed
///   (username length, email shape, password length, password mismatch)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthTokens>>)> {
    // Duplicate check runs before field validation, matching the documented
    // rejection order.
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "Account has been registered.".to_string(),
        ));
    }

    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "User registered successfully.",
            AuthTokens {
                user: UserPublic::from_user(&user),
                access_token,
                refresh_token,
            },
        )),
    ))
}

/// Login with email and password
///
/// Both an unknown email and a wrong password return the identical 401, so
/// the response never reveals which part failed. A successful login rotates
/// the stored refresh token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokens>>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password.".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::ok(
        "Login successful.",
        AuthTokens {
            user: UserPublic::from_user(&user),
            access_token,
            refresh_token,
        },
    )))
}

/// Exchange a refresh token for a new access token
///
/// The caller is resolved by the stored token value first: an unrecognized
/// token is 403, a recognized token that fails signature/expiry/type
/// verification is 401.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<RefreshedAccess>>> {
    let user = User::find_by_refresh_token(&state.db, &req.refresh_token)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Refresh token not recognized.".to_string()))?;

    jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let access_token =
        jwt::create_token(&Claims::new(user.id, TokenType::Access), state.jwt_secret())?;

    Ok(Json(ApiResponse::ok(
        "Access token refreshed successfully.",
        RefreshedAccess { access_token },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_password_length_boundaries() {
        // 7 and 16 rejected, 8 and 15 accepted.
        for bad in ["1234567", "1234567890123456"] {
            let req = request("jane", "jane@example.com", bad, bad);
            assert!(req.validate().is_err(), "{} chars should fail", bad.len());
        }

        for good in ["12345678", "123456789012345"] {
            let req = request("jane", "jane@example.com", good, good);
            assert!(req.validate().is_ok(), "{} chars should pass", good.len());
        }
    }

    #[test]
    fn test_username_over_50_chars_rejected() {
        let req = request(&"a".repeat(51), "jane@example.com", "secret123", "secret123");
        assert!(req.validate().is_err());

        let req = request(&"a".repeat(50), "jane@example.com", "secret123", "secret123");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_bad_email_shape_rejected() {
        let req = request("jane", "not-an-email", "secret123", "secret123");
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_email_over_255_chars_rejected() {
        // Valid shape, but longer than the column width.
        let email = format!("{}@example.com", "a".repeat(250));
        let req = request("jane", &email, "secret123", "secret123");
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        // Exactly 255 characters passes.
        let email = format!("{}@example.com", "a".repeat(243));
        assert_eq!(email.len(), 255);
        let req = request("jane", &email, "secret123", "secret123");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_password_mismatch_rejected() {
        let req = request("jane", "jane@example.com", "secret123", "secret124");
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }
}
