//! # Cash Notes API Server
//!
//! This library provides the core functionality for the Cash Notes API
//! server: a note-taking backend with JWT authentication, a note lifecycle
//! (active/archived/trashed), tagging, search, and pagination.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `response`: The success-response envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
