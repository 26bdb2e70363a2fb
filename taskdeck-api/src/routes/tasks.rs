/// Task endpoints
///
/// Every operation is scoped to the authenticated user. Listings are sorted
/// by `(order, id)` and paginated.
///
/// # Endpoints
///
/// - `GET /tasks` - List tasks (`page`, `search`, `priority`)
/// - `POST /tasks` - Create a task at the end of the sequence
/// - `PUT /tasks/reorder` - Bulk reorder
/// - `GET /tasks/priority` - Priority tasks only
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    routes::{nullable, required_text, storable_text, ListQuery, MessageResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use taskdeck_shared::{
    auth::{authorization, middleware::AuthContext},
    models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask},
    notify::EventKind,
    ordering::{bulk_reorder, OrderUpdate, ReorderScope},
    pagination::Page,
};
use tracing::{debug, info};
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to `pending`
    pub status: Option<TaskStatus>,

    /// `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,

    /// Ignored unless the owner is premium
    pub priority: Option<bool>,
}

/// Partial task update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: Option<String>,

    /// `null` clears the description
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    /// `null` clears the due date
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,

    pub order: Option<i32>,

    pub priority: Option<bool>,
}

/// Bulk reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderTasksRequest {
    #[serde(default)]
    pub tasks: Vec<OrderUpdate>,
}

/// Loads a task and checks the caller owns it
async fn load_owned_task(state: &AppState, auth: &AuthContext, id: i64) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    authorization::require_ownership(auth, task.user_id)?;

    Ok(task)
}

fn task_payload(task: &Task) -> serde_json::Value {
    json!({ "task_id": task.id, "title": task.title })
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Page<Task>>> {
    let filter = TaskFilter {
        search: query.search()?.map(str::to_string),
        priority_only: query.priority_only(),
    };

    let page = Task::list_for_owner(&state.db, auth.user_id, &filter, query.page_request()).await?;

    Ok(Json(page))
}

/// Lists priority tasks; accepts `page` and `search` like `GET /tasks`
pub async fn priority_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Page<Task>>> {
    let filter = TaskFilter {
        search: query.search()?.map(str::to_string),
        priority_only: true,
    };

    let page = Task::list_for_owner(&state.db, auth.user_id, &filter, query.page_request()).await?;

    Ok(Json(page))
}

/// Creates a task
///
/// Free accounts always get `priority = false`, whatever was requested.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;
    let title = required_text("title", &req.title)?;
    if let Some(ref description) = req.description {
        storable_text("description", description)?;
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            due_date: req.due_date,
            priority: authorization::effective_priority(&auth, req.priority, false),
        },
    )
    .await?;

    info!(user_id = auth.user_id, task_id = task.id, order = task.order, "Task created");
    state.notify(EventKind::TaskCreated, auth.user_id, task_payload(&task));

    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates a task
///
/// The priority column is always written: free accounts get `false`, premium
/// accounts keep the stored value when the field is omitted.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let title = req
        .title
        .as_deref()
        .map(|t| required_text("title", t))
        .transpose()?;
    if let Some(Some(ref description)) = req.description {
        storable_text("description", description)?;
    }

    let current = load_owned_task(&state, &auth, id).await?;

    let update = UpdateTask {
        title,
        description: req.description,
        status: req.status,
        due_date: req.due_date,
        order: req.order,
        priority: Some(authorization::effective_priority(
            &auth,
            req.priority,
            current.priority,
        )),
    };

    let task = Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    debug!(user_id = auth.user_id, task_id = task.id, "Task updated");
    state.notify(EventKind::TaskUpdated, auth.user_id, task_payload(&task));

    Ok(Json(task))
}

/// Deletes a task and its folder memberships
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let task = load_owned_task(&state, &auth, id).await?;

    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(user_id = auth.user_id, task_id = id, "Task deleted");
    state.notify(EventKind::TaskDeleted, auth.user_id, task_payload(&task));

    Ok(StatusCode::NO_CONTENT)
}

/// Applies a batch of `{id, order}` pairs to the caller's tasks
///
/// All-or-nothing: any unknown, foreign or duplicated id aborts the batch.
pub async fn reorder_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<ReorderTasksRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let updated = bulk_reorder(&state.db, ReorderScope::Owner(auth.user_id), &req.tasks)
        .await
        .map_err(|e| ApiError::from_reorder(e, "tasks"))?;

    info!(user_id = auth.user_id, updated, "Tasks reordered");

    Ok(Json(MessageResponse::new("Tasks reordered successfully")))
}
