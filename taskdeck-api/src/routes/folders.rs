/// Folder endpoints
///
/// Folders group a user's tasks with a per-folder order. Creating folders is
/// a premium feature; the remaining operations only require ownership.
///
/// # Endpoints
///
/// - `GET /folders` - List folders
/// - `POST /folders` - Create a folder (premium)
/// - `GET /folders/:id` - Show a folder
/// - `DELETE /folders/:id` - Delete a folder (tasks survive)
/// - `GET /folders/:id/tasks` - Folder tasks in membership order
/// - `POST /folders/:id/add-task` - Append a task to the folder
/// - `DELETE /folders/:id/remove-task/:task_id` - Remove a task (idempotent)
/// - `PUT /folders/:id/reorder-tasks` - Bulk reorder inside the folder

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    routes::{required_text, ListQuery, MessageResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use taskdeck_shared::{
    auth::{authorization, middleware::AuthContext},
    models::{
        folder::{CreateFolder, Folder},
        folder_task::{FolderTask, FolderTaskEntry},
        task::Task,
    },
    notify::EventKind,
    ordering::{bulk_reorder, OrderUpdate, ReorderScope},
    pagination::Page,
};
use tracing::info;
use validator::Validate;

/// Create folder request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,
}

/// Add task request
#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub task_id: Option<i64>,
}

/// Folder reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderFolderTasksRequest {
    #[serde(default)]
    pub orders: Vec<OrderUpdate>,
}

/// Loads a folder and checks the caller owns it
async fn load_owned_folder(state: &AppState, auth: &AuthContext, id: i64) -> ApiResult<Folder> {
    let folder = Folder::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Folder not found".to_string()))?;

    authorization::require_ownership(auth, folder.user_id)?;

    Ok(folder)
}

pub async fn list_folders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Page<Folder>>> {
    let page = Folder::list_for_owner(&state.db, auth.user_id, query.page_request()).await?;
    Ok(Json(page))
}

/// Creates a folder; premium accounts only
pub async fn create_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<Folder>)> {
    authorization::require_folder_access(&auth)?;

    req.validate()?;
    let name = required_text("name", &req.name)?;

    let folder = Folder::create(
        &state.db,
        CreateFolder {
            user_id: auth.user_id,
            name,
        },
    )
    .await?;

    info!(user_id = auth.user_id, folder_id = folder.id, "Folder created");
    state.notify(
        EventKind::FolderCreated,
        auth.user_id,
        json!({ "folder_id": folder.id, "name": folder.name }),
    );

    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn show_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Folder>> {
    Ok(Json(load_owned_folder(&state, &auth, id).await?))
}

/// Deletes a folder; its tasks are kept
pub async fn delete_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let folder = load_owned_folder(&state, &auth, id).await?;

    if !Folder::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Folder not found".to_string()));
    }

    info!(user_id = auth.user_id, folder_id = id, "Folder deleted");
    state.notify(
        EventKind::FolderDeleted,
        auth.user_id,
        json!({ "folder_id": folder.id, "name": folder.name }),
    );

    Ok(Json(MessageResponse::new("Folder deleted successfully.")))
}

/// Lists a folder's tasks by membership order, then task id
pub async fn folder_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Page<FolderTaskEntry>>> {
    load_owned_folder(&state, &auth, id).await?;

    let page =
        FolderTask::list_tasks(&state.db, id, query.search()?, query.page_request())
            .await?;

    Ok(Json(page))
}

/// Appends a task to a folder
///
/// # Errors
///
/// - `422`: `task_id` missing or unknown
/// - `403`: folder or task owned by someone else
/// - `409`: task already in the folder
pub async fn add_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<AddTaskRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let folder = load_owned_folder(&state, &auth, id).await?;

    let task_id = req
        .task_id
        .ok_or_else(|| ApiError::validation("task_id", "The task id field is required."))?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::validation("task_id", "The selected task id is invalid."))?;

    authorization::require_ownership(&auth, task.user_id)?;

    let membership = FolderTask::attach(&state.db, folder.id, auth.user_id, task.id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task is already in the folder.".to_string()))?;

    info!(
        user_id = auth.user_id,
        folder_id = folder.id,
        task_id = task.id,
        order = membership.order,
        "Task added to folder"
    );
    state.notify(
        EventKind::TaskAddedToFolder,
        auth.user_id,
        json!({ "folder_id": folder.id, "task_id": task.id, "order": membership.order }),
    );

    Ok(Json(MessageResponse::new("Task added to folder successfully.")))
}

/// Removes a task from a folder
///
/// Removing a task that is not a member succeeds without side effects.
pub async fn remove_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath((id, task_id)): AppPath<(i64, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    let folder = load_owned_folder(&state, &auth, id).await?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    authorization::require_ownership(&auth, task.user_id)?;

    if FolderTask::detach(&state.db, folder.id, task.id).await? {
        info!(user_id = auth.user_id, folder_id = folder.id, task_id = task.id, "Task removed from folder");
        state.notify(
            EventKind::TaskRemovedFromFolder,
            auth.user_id,
            json!({ "folder_id": folder.id, "task_id": task.id }),
        );
    }

    Ok(Json(MessageResponse::new("Task removed from folder successfully.")))
}

/// Applies a batch of `{id, order}` pairs to a folder's memberships
///
/// Every id must be a task the caller owns that is already in the folder.
pub async fn reorder_folder_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<ReorderFolderTasksRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let folder = load_owned_folder(&state, &auth, id).await?;

    let scope = ReorderScope::Folder {
        folder_id: folder.id,
        owner_id: auth.user_id,
    };

    let updated = bulk_reorder(&state.db, scope, &req.orders)
        .await
        .map_err(|e| ApiError::from_reorder(e, "orders"))?;

    info!(user_id = auth.user_id, folder_id = folder.id, updated, "Folder tasks reordered");

    Ok(Json(MessageResponse::new("Tasks reordered successfully.")))
}
