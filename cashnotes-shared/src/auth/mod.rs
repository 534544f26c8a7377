/// Authentication utilities
///
/// - `jwt`: HS256 token creation and validation (access + refresh)
/// - `password`: Argon2id hashing and verification
/// - `middleware`: auth context and error types for the bearer gate

pub mod jwt;
pub mod middleware;
pub mod password;
