/// Transactional persistence for positions
///
/// Every write that depends on the current shape of a scope runs inside a
/// transaction that first locks the scope row (`users` for an owner scope,
/// `folders` for a folder scope) with `SELECT ... FOR NO KEY UPDATE`. Concurrent
/// reorders and appends against the same scope therefore serialize, and the
/// last committed reorder wins. The weaker lock mode leaves foreign key
/// checks against the row (session and folder inserts) unblocked.

use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use super::{sequence, OrderUpdate, OrderingError, ReorderScope};

/// Locks the row backing `scope` until the surrounding transaction ends
///
/// # Errors
///
/// - `OrderingError::ScopeNotFound` if the user or folder does not exist
/// - `OrderingError::ScopeNotOwned` if the folder belongs to someone else
pub async fn lock_scope(conn: &mut PgConnection, scope: ReorderScope) -> Result<(), OrderingError> {
    match scope {
        ReorderScope::Owner(owner_id) => {
            let row: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
                    .bind(owner_id)
                    .fetch_optional(&mut *conn)
                    .await?;

            row.map(|_| ()).ok_or(OrderingError::ScopeNotFound(scope))
        }
        ReorderScope::Folder { folder_id, owner_id } => {
            let row: Option<(i64,)> =
                sqlx::query_as("SELECT user_id FROM folders WHERE id = $1 FOR NO KEY UPDATE")
                    .bind(folder_id)
                    .fetch_optional(&mut *conn)
                    .await?;

            match row {
                None => Err(OrderingError::ScopeNotFound(scope)),
                Some((folder_owner,)) if folder_owner != owner_id => {
                    Err(OrderingError::ScopeNotOwned(folder_id))
                }
                Some(_) => Ok(()),
            }
        }
    }
}

/// Locks `scope` and returns the append position for a new sibling
///
/// Must run inside a transaction; the insert that uses the returned position
/// has to happen in the same transaction to keep the count accurate.
pub async fn next_position(
    conn: &mut PgConnection,
    scope: ReorderScope,
) -> Result<i32, OrderingError> {
    lock_scope(conn, scope).await?;

    let count: i64 = match scope {
        ReorderScope::Owner(owner_id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
                .bind(owner_id)
                .fetch_one(&mut *conn)
                .await?
        }
        ReorderScope::Folder { folder_id, .. } => {
            sqlx::query_scalar("SELECT COUNT(*) FROM folder_task WHERE folder_id = $1")
                .bind(folder_id)
                .fetch_one(&mut *conn)
                .await?
        }
    };

    sequence::append_position(count)
}

/// Checks resolved `(id, owner)` rows against the requested ids
///
/// Unknown ids are reported before foreign ones.
pub(crate) fn check_resolution(
    owner_id: i64,
    requested: &[i64],
    resolved: &[(i64, i64)],
) -> Result<(), OrderingError> {
    let owners: HashMap<i64, i64> = resolved.iter().copied().collect();

    let unknown: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !owners.contains_key(id))
        .collect();
    if !unknown.is_empty() {
        return Err(OrderingError::UnknownEntity(unknown));
    }

    let foreign: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| owners.get(id) != Some(&owner_id))
        .collect();
    if !foreign.is_empty() {
        return Err(OrderingError::NotOwned(foreign));
    }

    Ok(())
}

/// Ids from `requested` that are missing from `members`
pub(crate) fn missing_members(requested: &[i64], members: &[i64]) -> Vec<i64> {
    let members: HashSet<i64> = members.iter().copied().collect();
    requested
        .iter()
        .copied()
        .filter(|id| !members.contains(id))
        .collect()
}

/// Applies a batch of new positions atomically
///
/// All ids are validated before anything is written: every id must name an
/// existing task owned by the scope's owner, and for a folder scope every task
/// must already be a member of the folder. Either the whole batch is written
/// or nothing is.
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `scope` - Owner or folder whose sequence is being rewritten
/// * `updates` - New positions, at most one entry per id
///
/// # Returns
///
/// Number of rows updated
///
/// # Errors
///
/// - `EmptyBatch` / `DuplicateId` for malformed batches
/// - `UnknownEntity` if an id does not exist
/// - `NotOwned` if a task belongs to another user
/// - `NotInScope` if a task is not a member of the folder
/// - `ScopeNotFound` for a missing user or folder, `ScopeNotOwned` for a
///   foreign folder
/// - `Database` for anything the store reports
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::ordering::{bulk_reorder, OrderUpdate, ReorderScope};
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let scope = ReorderScope::Folder { folder_id: 5, owner_id: 42 };
/// let updates = [OrderUpdate { id: 2, order: 0 }, OrderUpdate { id: 1, order: 1 }];
/// let updated = bulk_reorder(&pool, scope, &updates).await?;
/// assert_eq!(updated, 2);
/// # Ok(())
/// # }
/// ```
pub async fn bulk_reorder(
    pool: &PgPool,
    scope: ReorderScope,
    updates: &[OrderUpdate],
) -> Result<u64, OrderingError> {
    sequence::validate_batch(updates)?;

    let ids: Vec<i64> = updates.iter().map(|u| u.id).collect();
    let orders: Vec<i32> = updates.iter().map(|u| u.order).collect();

    let mut tx = pool.begin().await?;

    lock_scope(&mut tx, scope).await?;

    let resolved: Vec<(i64, i64)> =
        sqlx::query_as("SELECT id, user_id FROM tasks WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;

    check_resolution(scope.owner_id(), &ids, &resolved)?;

    let updated = match scope {
        ReorderScope::Owner(_) => {
            sqlx::query(
                r#"
                UPDATE tasks AS t
                SET "order" = u.new_order, updated_at = NOW()
                FROM UNNEST($1::bigint[], $2::int[]) AS u(id, new_order)
                WHERE t.id = u.id
                "#,
            )
            .bind(&ids)
            .bind(&orders)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        }
        ReorderScope::Folder { folder_id, .. } => {
            let members: Vec<i64> = sqlx::query_scalar(
                "SELECT task_id FROM folder_task WHERE folder_id = $1 AND task_id = ANY($2)",
            )
            .bind(folder_id)
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;

            let missing = missing_members(&ids, &members);
            if !missing.is_empty() {
                return Err(OrderingError::NotInScope {
                    folder_id,
                    task_ids: missing,
                });
            }

            sqlx::query(
                r#"
                UPDATE folder_task AS ft
                SET "order" = u.new_order
                FROM UNNEST($2::bigint[], $3::int[]) AS u(task_id, new_order)
                WHERE ft.folder_id = $1 AND ft.task_id = u.task_id
                "#,
            )
            .bind(folder_id)
            .bind(&ids)
            .bind(&orders)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        }
    };

    tx.commit().await?;

    debug!(scope = ?scope, updated, "Applied reorder batch");
    info!(owner_id = scope.owner_id(), entries = updates.len(), "Reorder committed");

    Ok(updated)
}
