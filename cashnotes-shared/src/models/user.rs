/// User model and database operations
///
/// Users own notes (one-to-many) and carry at most one refresh token — the
/// latest issued, overwritten on every login and rotation. Passwords are
/// stored as Argon2id hashes, never in plaintext. Users are never
/// soft-deleted in this design.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(50) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     refresh_token TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationError;

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display/login name, unique, at most 50 characters
    pub username: String,

    /// Email address, unique
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Latest issued refresh token (None before first registration completes)
    pub refresh_token: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, refresh_token, \
                            created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation when the email or username is
    /// already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the user owning a stored refresh token
    ///
    /// The refresh flow resolves the caller by token value before verifying
    /// the token's signature and expiry.
    pub async fn find_by_refresh_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE refresh_token = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Overwrites the stored refresh token (rotation on login/registration)
    pub async fn set_refresh_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }
}

/// Checks the basic `local@domain.tld` email shape
///
/// Both sides of the `@` must be non-empty and whitespace-free, and the
/// domain must contain a dot with non-empty pieces on each side.
pub fn is_valid_email_shape(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// validator-compatible wrapper around [`is_valid_email_shape`]
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if is_valid_email_shape(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email_shape"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_shapes() {
        assert!(is_valid_email_shape("user@example.com"));
        assert!(is_valid_email_shape("a@b.co"));
        assert!(is_valid_email_shape("first.last@sub.example.org"));
    }

    #[test]
    fn test_invalid_email_shapes() {
        assert!(!is_valid_email_shape("plainaddress"));
        assert!(!is_valid_email_shape("user@domain"));
        assert!(!is_valid_email_shape("@example.com"));
        assert!(!is_valid_email_shape("user@.com"));
        assert!(!is_valid_email_shape("user@example."));
        assert!(!is_valid_email_shape("us er@example.com"));
        assert!(!is_valid_email_shape("user@exa mple.com"));
        assert!(!is_valid_email_shape("user@@example.com"));
        assert!(!is_valid_email_shape(""));
    }

    #[test]
    fn test_validator_wrapper() {
        assert!(validate_email_shape("user@example.com").is_ok());
        assert!(validate_email_shape("nope").is_err());
    }
}
