/// Folder model and database operations
///
/// Folders are a premium feature. Deleting a folder removes its memberships
/// (`ON DELETE CASCADE` on `folder_task`) but never the tasks themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::pagination::{Page, PageRequest};

/// A named, user-owned collection of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID
    pub id: i64,

    /// Owner
    pub user_id: i64,

    /// Display name (1..=255 chars)
    pub name: String,

    /// When the folder was created
    pub created_at: DateTime<Utc>,

    /// When the folder was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new folder
#[derive(Debug, Clone)]
pub struct CreateFolder {
    /// Owner
    pub user_id: i64,

    /// Display name
    pub name: String,
}

impl Folder {
    /// Creates a folder
    pub async fn create(pool: &PgPool, data: CreateFolder) -> Result<Self, sqlx::Error> {
        let folder = sqlx::query_as::<_, Folder>(
            r#"
            INSERT INTO folders (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .fetch_one(pool)
        .await?;

        Ok(folder)
    }

    /// Finds a folder by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let folder = sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM folders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(folder)
    }

    /// Lists one page of an owner's folders, oldest first
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: i64,
        request: PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await?;

        let folders = sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM folders
            WHERE user_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page::new(folders, request, total))
    }

    /// Deletes a folder and its memberships
    ///
    /// # Returns
    ///
    /// True if the folder was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
