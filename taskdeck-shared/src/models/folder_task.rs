/// Folder membership pivot
///
/// A task can sit in many folders and a folder holds many tasks. Each
/// membership has its own `order`, independent of the task's position in its
/// owner's sequence.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE folder_task (
///     folder_id BIGINT NOT NULL REFERENCES folders (id) ON DELETE CASCADE,
///     task_id BIGINT NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
///     "order" INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (folder_id, task_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::task::Task;
use crate::ordering::{next_position, OrderingError, Positioned, ReorderScope};
use crate::pagination::{normalize_search, Page, PageRequest};

/// A membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FolderTask {
    /// Folder
    pub folder_id: i64,

    /// Task
    pub task_id: i64,

    /// Position within the folder
    pub order: i32,

    /// When the task was added
    pub created_at: DateTime<Utc>,
}

/// Membership data attached to a task listed through a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pivot {
    /// Folder
    #[sqlx(rename = "pivot_folder_id")]
    pub folder_id: i64,

    /// Task
    #[sqlx(rename = "pivot_task_id")]
    pub task_id: i64,

    /// Position within the folder
    #[sqlx(rename = "pivot_order")]
    pub order: i32,
}

/// A task as seen inside a folder
///
/// Serializes as the task's fields plus a `pivot` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FolderTaskEntry {
    /// The task itself
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub task: Task,

    /// Membership data
    #[sqlx(flatten)]
    pub pivot: Pivot,
}

impl Positioned for FolderTaskEntry {
    fn entity_id(&self) -> i64 {
        self.task.id
    }

    fn position(&self) -> i32 {
        self.pivot.order
    }

    fn set_position(&mut self, position: i32) {
        self.pivot.order = position;
    }
}

impl FolderTask {
    /// Adds a task at the end of a folder
    ///
    /// The folder row is locked while its membership count is read and the
    /// new membership inserted. Callers check that the task exists and is
    /// owned by `owner_id`.
    ///
    /// # Returns
    ///
    /// The new membership, or None if the task was already in the folder
    ///
    /// # Errors
    ///
    /// - `OrderingError::ScopeNotFound` if the folder doesn't exist
    /// - `OrderingError::ScopeNotOwned` if the folder belongs to someone else
    pub async fn attach(
        pool: &PgPool,
        folder_id: i64,
        owner_id: i64,
        task_id: i64,
    ) -> Result<Option<Self>, OrderingError> {
        let mut tx = pool.begin().await?;

        let position = next_position(&mut tx, ReorderScope::Folder { folder_id, owner_id }).await?;

        let membership = sqlx::query_as::<_, FolderTask>(
            r#"
            INSERT INTO folder_task (folder_id, task_id, "order")
            VALUES ($1, $2, $3)
            ON CONFLICT (folder_id, task_id) DO NOTHING
            RETURNING folder_id, task_id, "order", created_at
            "#,
        )
        .bind(folder_id)
        .bind(task_id)
        .bind(position)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(membership)
    }

    /// Removes a task from a folder
    ///
    /// # Returns
    ///
    /// True if a membership was removed, false if the task wasn't a member
    pub async fn detach(pool: &PgPool, folder_id: i64, task_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM folder_task WHERE folder_id = $1 AND task_id = $2")
            .bind(folder_id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of tasks in a folder
    pub async fn count_for_folder(pool: &PgPool, folder_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM folder_task WHERE folder_id = $1")
            .bind(folder_id)
            .fetch_one(pool)
            .await
    }

    /// Lists one page of a folder's tasks in membership order
    ///
    /// Sorted by membership `order`, ties broken by task id.
    pub async fn list_tasks(
        pool: &PgPool,
        folder_id: i64,
        search: Option<&str>,
        request: PageRequest,
    ) -> Result<Page<FolderTaskEntry>, sqlx::Error> {
        let pattern = normalize_search(search);

        let mut conditions = String::from("ft.folder_id = $1");
        let mut bind_count = 1;
        if pattern.is_some() {
            bind_count += 1;
            conditions.push_str(&format!(r" AND t.title ILIKE ${} ESCAPE '\'", bind_count));
        }

        let count_query = format!(
            "SELECT COUNT(*) FROM folder_task ft JOIN tasks t ON t.id = ft.task_id WHERE {}",
            conditions
        );
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(folder_id);
        if let Some(ref pattern) = pattern {
            count = count.bind(pattern.as_str());
        }
        let total = count.fetch_one(pool).await?;

        let list_query = format!(
            r#"
            SELECT t.id, t.user_id, t.title, t.description, t.status, t.due_date,
                   t.priority, t."order", t.created_at, t.updated_at,
                   ft.folder_id AS pivot_folder_id,
                   ft.task_id AS pivot_task_id,
                   ft."order" AS pivot_order
            FROM folder_task ft
            JOIN tasks t ON t.id = ft.task_id
            WHERE {}
            ORDER BY ft."order" ASC, t.id ASC
            LIMIT ${} OFFSET ${}
            "#,
            conditions,
            bind_count + 1,
            bind_count + 2
        );
        let mut list = sqlx::query_as::<_, FolderTaskEntry>(&list_query).bind(folder_id);
        if let Some(ref pattern) = pattern {
            list = list.bind(pattern.as_str());
        }
        let entries = list
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(entries, request, total))
    }
}
