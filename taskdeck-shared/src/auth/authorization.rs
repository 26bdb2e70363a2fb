/// Access policy
///
/// Pure predicates over the request's [`AuthContext`]:
///
/// 1. **Ownership**: tasks and folders are visible only to their owner
/// 2. **Feature gates**: folders and priority flags require premium
///
/// Ownership violations are reported as `AuthzError::NotOwner`, which the API
/// maps to 403. That tells a caller that the id exists; see DESIGN.md.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::authorization::{effective_priority, require_ownership};
/// use taskdeck_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: 1, session_id: Uuid::new_v4(), is_premium: false };
/// assert!(require_ownership(&auth, 1).is_ok());
/// assert!(require_ownership(&auth, 2).is_err());
///
/// // Free accounts never get priority
/// assert!(!effective_priority(&auth, Some(true), true));
/// ```

use super::middleware::AuthContext;
use crate::models::{folder::Folder, task::Task};

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The resource belongs to another user
    #[error("Not authorized to access this resource")]
    NotOwner,

    /// The feature needs the premium tier
    #[error("This feature is only available for premium users.")]
    PremiumRequired,
}

/// Whether `auth` owns a resource owned by `owner_id`
pub fn owns(auth: &AuthContext, owner_id: i64) -> bool {
    auth.user_id == owner_id
}

/// Whether `auth` owns `task`
pub fn owns_task(auth: &AuthContext, task: &Task) -> bool {
    owns(auth, task.user_id)
}

/// Whether `auth` owns `folder`
pub fn owns_folder(auth: &AuthContext, folder: &Folder) -> bool {
    owns(auth, folder.user_id)
}

/// Whether `auth` may create and use folders
pub fn can_use_folders(auth: &AuthContext) -> bool {
    auth.is_premium
}

/// Whether `auth` may set the priority flag
pub fn can_set_priority(auth: &AuthContext) -> bool {
    auth.is_premium
}

/// Fails unless `auth` owns a resource owned by `owner_id`
pub fn require_ownership(auth: &AuthContext, owner_id: i64) -> Result<(), AuthzError> {
    if owns(auth, owner_id) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Fails unless `auth` is on the premium tier
pub fn require_folder_access(auth: &AuthContext) -> Result<(), AuthzError> {
    if can_use_folders(auth) {
        Ok(())
    } else {
        Err(AuthzError::PremiumRequired)
    }
}

/// Priority value to store, applying the silent override for free accounts
///
/// - Free accounts: always `false`, whatever was requested.
/// - Premium accounts: the requested value, or `current` when the field was
///   omitted.
pub fn effective_priority(auth: &AuthContext, requested: Option<bool>, current: bool) -> bool {
    if can_set_priority(auth) {
        requested.unwrap_or(current)
    } else {
        false
    }
}
