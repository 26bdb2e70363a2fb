/// Database models for Taskdeck
///
/// - `user`: accounts and the premium flag
/// - `session`: revocable bearer-token sessions
/// - `task`: tasks with their per-owner position
/// - `folder`: premium folders
/// - `folder_task`: folder membership with per-folder position

pub mod folder;
pub mod folder_task;
pub mod session;
pub mod task;
pub mod user;
