/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login and logout
/// - `user`: Current user profile and premium activation
/// - `tasks`: Task CRUD, listing and bulk reorder
/// - `folders`: Folders, membership and in-folder reorder

pub mod auth;
pub mod folders;
pub mod health;
pub mod tasks;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};
use taskdeck_shared::pagination::PageRequest;

use crate::error::{ApiError, ApiResult};

/// Plain `{ "message": ... }` response body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query parameters shared by the list endpoints
///
/// Values are taken as raw strings so a malformed `page` falls back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<String>,

    /// Title substring filter
    pub search: Option<String>,

    /// Priority-only filter flag
    pub priority: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.as_deref().and_then(|p| p.trim().parse().ok()))
    }

    /// Search term, rejected if Postgres could not compare it
    pub fn search(&self) -> ApiResult<Option<&str>> {
        match self.search.as_deref() {
            Some(term) => storable_text("search", term).map(|_| Some(term)),
            None => Ok(None),
        }
    }

    /// Priority filter applies when the parameter is present and not `0`/`false`
    pub fn priority_only(&self) -> bool {
        match self.priority.as_deref().map(str::trim) {
            Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
            None => false,
        }
    }
}

/// Deserializes a field that distinguishes "absent" from "null"
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: an absent
/// field stays `None`, an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects text containing NUL, which Postgres text columns cannot hold
pub(crate) fn storable_text(field: &str, value: &str) -> ApiResult<()> {
    if value.contains('\0') {
        return Err(ApiError::validation(
            field,
            format!("The {} field must not contain NUL characters.", field),
        ));
    }
    Ok(())
}

/// Trims a required text field, rejecting blank input
pub(crate) fn required_text(field: &str, value: &str) -> ApiResult<String> {
    storable_text(field, value)?;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(
            field,
            format!("The {} field is required.", field),
        ));
    }
    Ok(trimmed.to_string())
}
