/// Ordering engine for tasks and folder memberships
///
/// Every task carries an integer `order` scoped to its owner, and every
/// folder membership carries an `order` scoped to its folder. Positions are
/// advisory: gaps and ties are tolerated, and every listing breaks ties by
/// entity id so the resulting sequence is a deterministic total order.
///
/// # Modules
///
/// - [`sequence`]: pure sequence operations (validation, append position,
///   sorting, local moves and renumbering)
/// - [`persist`]: transactional bulk reorder and scope locking against PostgreSQL
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::ordering::{bulk_reorder, OrderUpdate, ReorderScope};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let updates = vec![
///     OrderUpdate { id: 3, order: 0 },
///     OrderUpdate { id: 1, order: 1 },
///     OrderUpdate { id: 2, order: 2 },
/// ];
///
/// bulk_reorder(&pool, ReorderScope::Owner(42), &updates).await?;
/// # Ok(())
/// # }
/// ```

pub mod persist;
pub mod sequence;

pub use persist::{bulk_reorder, lock_scope, next_position};
pub use sequence::{
    append_position, move_item, order_updates, renumber_from, sort_by_position, validate_batch,
    Positioned,
};

use serde::{Deserialize, Serialize};

/// One entry of a bulk reorder request: entity `id` moves to position `order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Task id
    pub id: i64,

    /// New position within the scope
    pub order: i32,
}

/// The collection a position is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    /// All tasks of one owner
    Owner(i64),

    /// Memberships of one folder
    Folder {
        /// Folder id
        folder_id: i64,

        /// Owner the folder must belong to
        owner_id: i64,
    },
}

impl ReorderScope {
    /// Owner every entity in this scope must belong to
    pub fn owner_id(&self) -> i64 {
        match self {
            ReorderScope::Owner(owner_id) => *owner_id,
            ReorderScope::Folder { owner_id, .. } => *owner_id,
        }
    }
}

/// Error type for ordering operations
#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    /// Reorder batch contained no entries
    #[error("Reorder batch must contain at least one entry")]
    EmptyBatch,

    /// The same id appeared twice in one batch
    #[error("Task {0} appears more than once in the reorder batch")]
    DuplicateId(i64),

    /// Some ids do not refer to an existing task
    #[error("Unknown task ids: {0:?}")]
    UnknownEntity(Vec<i64>),

    /// Some tasks belong to another owner
    #[error("Tasks not owned by the requester: {0:?}")]
    NotOwned(Vec<i64>),

    /// Some tasks are not members of the folder being reordered
    #[error("Tasks {task_ids:?} are not in folder {folder_id}")]
    NotInScope { folder_id: i64, task_ids: Vec<i64> },

    /// The scope row (user or folder) does not exist
    #[error("Reorder scope {0:?} not found")]
    ScopeNotFound(ReorderScope),

    /// The folder being reordered belongs to another owner
    #[error("Folder {0} is not owned by the requester")]
    ScopeNotOwned(i64),

    /// Sibling count does not fit into a position
    #[error("Sibling count {0} exceeds the position range")]
    PositionOverflow(i64),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
