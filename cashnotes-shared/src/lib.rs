//! # Cashnotes Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the Cashnotes API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and the note lifecycle state machine
//! - `auth`: Password hashing, JWT tokens, and the bearer auth context
//! - `db`: Connection pool and migration runner
//! - `pagination`: Page metadata calculator for list endpoints
//! - `search`: Search query validation and SQL filter generation

pub mod auth;
pub mod db;
pub mod models;
pub mod pagination;
pub mod search;

/// Current version of the Cashnotes shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
