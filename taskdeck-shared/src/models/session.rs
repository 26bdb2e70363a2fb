/// Bearer-token sessions
///
/// Each issued access token references one session row through its `sid`
/// claim. Logging out revokes the row, which invalidates the token even
/// before it expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A login session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Session ID, embedded in the token as `sid`
    pub id: Uuid,

    /// User the session belongs to
    pub user_id: i64,

    /// When the session was opened
    pub created_at: DateTime<Utc>,

    /// Last authenticated request
    pub last_used_at: Option<DateTime<Utc>>,

    /// When the session was revoked (None while active)
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Identity resolved from an active session
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionPrincipal {
    /// Authenticated user
    pub user_id: i64,

    /// Premium flag as currently stored, not as of token issue
    pub is_premium: bool,
}

impl Session {
    /// Opens a new session for `user_id`
    pub async fn create(pool: &PgPool, user_id: i64) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id)
            VALUES ($1)
            RETURNING id, user_id, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    /// Resolves an active session and records its use
    ///
    /// Returns None when the session does not exist, is revoked, or belongs to
    /// a different user than the token claims.
    pub async fn authenticate(
        pool: &PgPool,
        session_id: Uuid,
        user_id: i64,
    ) -> Result<Option<SessionPrincipal>, sqlx::Error> {
        let principal = sqlx::query_as::<_, SessionPrincipal>(
            r#"
            UPDATE sessions AS s
            SET last_used_at = NOW()
            FROM users AS u
            WHERE s.id = $1
              AND s.user_id = $2
              AND s.revoked_at IS NULL
              AND u.id = s.user_id
            RETURNING u.id AS user_id, u.is_premium
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(principal)
    }

    /// Revokes a session
    ///
    /// # Returns
    ///
    /// True if an active session was revoked
    pub async fn revoke(pool: &PgPool, session_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
