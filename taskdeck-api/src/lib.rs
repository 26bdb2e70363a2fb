//! # Taskdeck API Server Library
//!
//! HTTP layer of the Taskdeck task manager: configuration, router, session
//! authentication and the task/folder handlers.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Body, path and query extractors with JSON rejections
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
