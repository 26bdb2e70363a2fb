//! # Taskdeck Shared Library
//!
//! Domain types and persistence shared by the API server and the client.
//!
//! ## Module Organization
//!
//! - `ordering`: positions, bulk reorder and deterministic sorting
//! - `models`: database models for users, sessions, tasks and folders
//! - `auth`: password hashing, tokens, request context and access policy
//! - `notify`: fire-and-forget lifecycle notifications
//! - `pagination`: page envelope and search helpers
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;
pub mod ordering;
pub mod pagination;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
