/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `notes`: Note CRUD, lifecycle, tagging, search, and listings

pub mod auth;
pub mod health;
pub mod notes;
