/// Task model and database operations
///
/// Tasks belong to exactly one user. Each carries an advisory `order` within
/// its owner's sequence; new tasks are appended at the owner's current task
/// count, and deletions never renumber the remaining tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     due_date DATE,
///     priority BOOLEAN NOT NULL DEFAULT FALSE,
///     "order" INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{CreateTask, Task, TaskFilter, TaskStatus};
/// use taskdeck_shared::pagination::PageRequest;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     user_id,
///     title: "Buy milk".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
///     due_date: None,
///     priority: false,
/// }).await?;
///
/// let page = Task::list_for_owner(&pool, user_id, &TaskFilter::default(), PageRequest::default()).await?;
/// assert!(page.data.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::ordering::{next_position, OrderingError, Positioned, ReorderScope};
use crate::pagination::{normalize_search, Page, PageRequest};

const TASK_COLUMNS: &str = r#"id, user_id, title, description, status, due_date, priority, "order", created_at, updated_at"#;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Gets status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// A task owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Owner
    pub user_id: i64,

    /// Title (1..=255 chars)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Priority flag, only ever true for premium owners
    pub priority: bool,

    /// Advisory position in the owner's sequence
    pub order: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Positioned for Task {
    fn entity_id(&self) -> i64 {
        self.id
    }

    fn position(&self) -> i32 {
        self.order
    }

    fn set_position(&mut self, position: i32) {
        self.order = position;
    }
}

/// Input for creating a new task
///
/// `priority` must already reflect the access policy; it is stored as given.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owner
    pub user_id: i64,

    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Priority flag
    pub priority: bool,
}

/// Input for updating an existing task
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New due date (use Some(None) to clear)
    pub due_date: Option<Option<NaiveDate>>,

    /// New position
    pub order: Option<i32>,

    /// New priority flag
    pub priority: Option<bool>,
}

/// Listing filter for an owner's tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive title substring
    pub search: Option<String>,

    /// Only tasks with `priority = true`
    pub priority_only: bool,
}

impl Task {
    /// Creates a task at the end of its owner's sequence
    ///
    /// The owner's row is locked while the task count is read and the new row
    /// inserted, so concurrent creates get distinct positions.
    ///
    /// # Errors
    ///
    /// - `OrderingError::ScopeNotFound` if the owner doesn't exist
    /// - `OrderingError::Database` if the database fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, OrderingError> {
        let mut tx = pool.begin().await?;

        let position = next_position(&mut tx, ReorderScope::Owner(data.user_id)).await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, status, due_date, priority, "order")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists one page of an owner's tasks in sequence order
    ///
    /// Rows are sorted by `order` ascending with ties broken by `id`, so
    /// repeated calls always return the same total order.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: i64,
        filter: &TaskFilter,
        request: PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let pattern = normalize_search(filter.search.as_deref());

        let mut conditions = String::from("user_id = $1");
        let mut bind_count = 1;

        if pattern.is_some() {
            bind_count += 1;
            conditions.push_str(&format!(r" AND title ILIKE ${} ESCAPE '\'", bind_count));
        }
        if filter.priority_only {
            conditions.push_str(" AND priority");
        }

        let count_query = format!("SELECT COUNT(*) FROM tasks WHERE {}", conditions);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(owner_id);
        if let Some(ref pattern) = pattern {
            count = count.bind(pattern.as_str());
        }
        let total = count.fetch_one(pool).await?;

        let list_query = format!(
            r#"SELECT {} FROM tasks WHERE {} ORDER BY "order" ASC, id ASC LIMIT ${} OFFSET ${}"#,
            TASK_COLUMNS,
            conditions,
            bind_count + 1,
            bind_count + 2
        );
        let mut list = sqlx::query_as::<_, Task>(&list_query).bind(owner_id);
        if let Some(ref pattern) = pattern {
            list = list.bind(pattern.as_str());
        }
        let tasks = list
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(tasks, request, total))
    }

    /// Updates an existing task
    ///
    /// # Returns
    ///
    /// The updated task if found, None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.order.is_some() {
            bind_count += 1;
            query.push_str(&format!(r#", "order" = ${}"#, bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(order) = data.order {
            q = q.bind(order);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task; its folder memberships go with it
    ///
    /// Remaining tasks keep their positions.
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of tasks an owner has
    pub async fn count_for_owner(pool: &PgPool, owner_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }
}
