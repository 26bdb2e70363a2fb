//! # Taskdeck Client
//!
//! Typed access to the Taskdeck API plus the state a front end keeps between
//! calls.
//!
//! ## Modules
//!
//! - `api`: reqwest-based client for every endpoint
//! - `board`: optimistic drag-and-drop reordering with rollback
//! - `query`: list query (page, search, priority) and page cursor
//! - `error`: client error type

pub mod api;
pub mod board;
pub mod error;
pub mod query;

pub use api::{ApiClient, AuthPayload, Message, NewTask, PremiumStatus, TaskPatch};
pub use board::{FolderOrderSync, OrderSync, OrderedBoard, TaskOrderSync};
pub use error::{ClientError, FieldError};
pub use query::{PageCursor, TaskQuery};
