/// Optimistic reordering with rollback
///
/// An [`OrderedBoard`] mirrors one page of a task list or a folder. A move is
/// applied locally first, the renumbered page is pushed through an
/// [`OrderSync`], and the local state reverts to the pre-move snapshot if the
/// push fails. The dashboard and the folder views share this code path and
/// only differ in the sync they pass in.
///
/// # Example
///
/// ```no_run
/// use taskdeck_client::{ApiClient, OrderedBoard, TaskOrderSync, TaskQuery};
///
/// # async fn example(client: ApiClient) -> Result<(), taskdeck_client::ClientError> {
/// let page = client.list_tasks(&TaskQuery::new()).await?;
/// let mut board = OrderedBoard::from_page(page)?;
///
/// // drag the third task to the top
/// board.reorder(&TaskOrderSync::new(&client), 2, 0).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use taskdeck_shared::{
    ordering::{move_item, order_updates, renumber_from, sort_by_position, OrderUpdate, Positioned},
    pagination::Page,
};
use tracing::{debug, warn};

use crate::{api::ApiClient, error::ClientError};

/// Pushes a renumbered list to the server
#[async_trait]
pub trait OrderSync: Send + Sync {
    async fn push(&self, updates: &[OrderUpdate]) -> Result<(), ClientError>;
}

/// Syncs the caller's task list (`PUT /tasks/reorder`)
#[derive(Debug, Clone, Copy)]
pub struct TaskOrderSync<'a> {
    client: &'a ApiClient,
}

impl<'a> TaskOrderSync<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderSync for TaskOrderSync<'_> {
    async fn push(&self, updates: &[OrderUpdate]) -> Result<(), ClientError> {
        self.client.reorder_tasks(updates).await.map(|_| ())
    }
}

/// Syncs one folder's membership order (`PUT /folders/:id/reorder-tasks`)
#[derive(Debug, Clone, Copy)]
pub struct FolderOrderSync<'a> {
    client: &'a ApiClient,
    folder_id: i64,
}

impl<'a> FolderOrderSync<'a> {
    pub fn new(client: &'a ApiClient, folder_id: i64) -> Self {
        Self { client, folder_id }
    }
}

#[async_trait]
impl OrderSync for FolderOrderSync<'_> {
    async fn push(&self, updates: &[OrderUpdate]) -> Result<(), ClientError> {
        self.client
            .reorder_folder_tasks(self.folder_id, updates)
            .await
            .map(|_| ())
    }
}

/// Locally ordered list with a pending-move snapshot
#[derive(Debug, Clone)]
pub struct OrderedBoard<T> {
    items: Vec<T>,
    base: i32,
    snapshot: Option<Vec<T>>,
}

impl<T: Positioned + Clone> OrderedBoard<T> {
    /// Board numbered from 0
    pub fn new(items: Vec<T>) -> Self {
        Self::with_base(items, 0)
    }

    /// Board numbered from `base`, for a page that does not start the list
    pub fn with_base(mut items: Vec<T>, base: i32) -> Self {
        sort_by_position(&mut items);
        Self {
            items,
            base,
            snapshot: None,
        }
    }

    /// Board for a fetched page, numbered from the page offset
    pub fn from_page(page: Page<T>) -> Result<Self, ClientError> {
        let offset = (page.current_page - 1).max(0) * page.per_page;
        let base = i32::try_from(offset).map_err(|_| ClientError::PositionOverflow(offset))?;
        Ok(Self::with_base(page.data, base))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn base(&self) -> i32 {
        self.base
    }

    /// Whether a move is waiting for confirmation
    pub fn is_pending(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Replaces the contents after a fresh fetch, dropping any snapshot
    pub fn replace(&mut self, mut items: Vec<T>) {
        sort_by_position(&mut items);
        self.items = items;
        self.snapshot = None;
    }

    /// Moves the item at `from` to `to` and renumbers the board
    ///
    /// Returns the full reorder payload for the board. The pre-move state is
    /// kept until [`confirm`](Self::confirm) or [`rollback`](Self::rollback).
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<Vec<OrderUpdate>, ClientError> {
        let len = self.items.len();
        if from >= len || to >= len {
            return Err(ClientError::OutOfRange { from, to, len });
        }

        self.snapshot = Some(self.items.clone());
        move_item(&mut self.items, from, to);
        renumber_from(&mut self.items, self.base);

        Ok(order_updates(&self.items))
    }

    /// Accepts the last move
    pub fn confirm(&mut self) {
        self.snapshot = None;
    }

    /// Restores the state before the last move
    ///
    /// Returns false when there was nothing to restore.
    pub fn rollback(&mut self) -> bool {
        match self.snapshot.take() {
            Some(previous) => {
                self.items = previous;
                true
            }
            None => false,
        }
    }

    /// Moves locally, pushes the new order and rolls back on failure
    pub async fn reorder<S>(&mut self, sync: &S, from: usize, to: usize) -> Result<(), ClientError>
    where
        S: OrderSync + ?Sized,
    {
        let updates = self.move_item(from, to)?;

        match sync.push(&updates).await {
            Ok(()) => {
                debug!(from, to, entries = updates.len(), "Reorder confirmed");
                self.confirm();
                Ok(())
            }
            Err(e) => {
                warn!(from, to, error = %e, "Reorder failed, restoring previous order");
                self.rollback();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use taskdeck_shared::pagination::PageRequest;

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        id: i64,
        position: i32,
    }

    impl Positioned for Card {
        fn entity_id(&self) -> i64 {
            self.id
        }

        fn position(&self) -> i32 {
            self.position
        }

        fn set_position(&mut self, position: i32) {
            self.position = position;
        }
    }

    fn cards(ids: &[i64]) -> Vec<Card> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Card {
                id: *id,
                position: i as i32,
            })
            .collect()
    }

    fn ids(board: &OrderedBoard<Card>) -> Vec<i64> {
        board.items().iter().map(|c| c.id).collect()
    }

    /// Records pushed batches and fails when told to
    struct MockSync {
        fail: bool,
        pushed: Mutex<Vec<Vec<OrderUpdate>>>,
    }

    impl MockSync {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                pushed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OrderSync for MockSync {
        async fn push(&self, updates: &[OrderUpdate]) -> Result<(), ClientError> {
            self.pushed.lock().unwrap().push(updates.to_vec());
            if self.fail {
                Err(ClientError::from_body(403, r#"{"error":"forbidden","message":"no"}"#))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_new_sorts_by_position_then_id() {
        let board = OrderedBoard::new(vec![
            Card { id: 3, position: 1 },
            Card { id: 2, position: 1 },
            Card { id: 1, position: 7 },
        ]);
        assert_eq!(ids(&board), vec![2, 3, 1]);
    }

    #[test]
    fn test_move_renumbers_from_base() {
        let mut board = OrderedBoard::with_base(cards(&[1, 2, 3]), 10);
        let updates = board.move_item(2, 0).unwrap();

        assert_eq!(ids(&board), vec![3, 1, 2]);
        assert_eq!(
            updates,
            vec![
                OrderUpdate { id: 3, order: 10 },
                OrderUpdate { id: 1, order: 11 },
                OrderUpdate { id: 2, order: 12 },
            ]
        );
        assert!(board.is_pending());
    }

    #[test]
    fn test_move_out_of_range_leaves_board_untouched() {
        let mut board = OrderedBoard::new(cards(&[1, 2]));
        assert!(matches!(
            board.move_item(0, 2),
            Err(ClientError::OutOfRange { len: 2, .. })
        ));
        assert_eq!(ids(&board), vec![1, 2]);
        assert!(!board.is_pending());
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let mut board = OrderedBoard::new(cards(&[1, 2, 3]));
        let before = board.items().to_vec();

        board.move_item(0, 2).unwrap();
        assert!(board.rollback());
        assert_eq!(board.items(), before.as_slice());
        assert!(!board.rollback());
    }

    #[test]
    fn test_from_page_uses_page_offset() {
        let page = Page::new(cards(&[11, 12]), PageRequest::new(Some(3)), 22);
        let board = OrderedBoard::from_page(page).unwrap();
        assert_eq!(board.base(), 20);
    }

    #[tokio::test]
    async fn test_reorder_confirms_on_success() {
        let sync = MockSync::new(false);
        let mut board = OrderedBoard::new(cards(&[1, 2, 3]));

        board.reorder(&sync, 2, 0).await.unwrap();

        assert_eq!(ids(&board), vec![3, 1, 2]);
        assert!(!board.is_pending());
        let pushed = sync.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].len(), 3);
    }

    #[tokio::test]
    async fn test_failed_reorder_restores_order() {
        let sync = MockSync::new(true);
        let mut board = OrderedBoard::new(cards(&[1, 2, 3]));
        let before = board.items().to_vec();

        let err = board.reorder(&sync, 0, 2).await.unwrap_err();

        assert!(err.is_forbidden());
        assert_eq!(board.items(), before.as_slice());
        assert!(!board.is_pending());
    }

    #[tokio::test]
    async fn test_reorder_through_trait_object() {
        let sync: Box<dyn OrderSync> = Box::new(MockSync::new(true));
        let mut board = OrderedBoard::new(cards(&[5, 6]));

        assert!(board.reorder(sync.as_ref(), 1, 0).await.is_err());
        assert_eq!(ids(&board), vec![5, 6]);
    }
}
