/// Pure operations over positioned sequences
///
/// Nothing in here touches the database, so the same logic drives server-side
/// validation and the client's optimistic reordering.

use std::collections::HashSet;

use super::{OrderUpdate, OrderingError};

/// An entity with a stable id and a mutable advisory position
pub trait Positioned {
    /// Id used as the tie-break when positions collide
    fn entity_id(&self) -> i64;

    /// Current position
    fn position(&self) -> i32;

    /// Overwrites the position
    fn set_position(&mut self, position: i32);
}

/// Checks that a reorder batch is non-empty and mentions every id at most once
///
/// # Errors
///
/// - `OrderingError::EmptyBatch` for an empty batch
/// - `OrderingError::DuplicateId` for the first repeated id
///
/// # Example
///
/// ```
/// use taskdeck_shared::ordering::{validate_batch, OrderUpdate};
///
/// let batch = [OrderUpdate { id: 1, order: 0 }, OrderUpdate { id: 1, order: 1 }];
/// assert!(validate_batch(&batch).is_err());
/// ```
pub fn validate_batch(updates: &[OrderUpdate]) -> Result<(), OrderingError> {
    if updates.is_empty() {
        return Err(OrderingError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(updates.len());
    for update in updates {
        if !seen.insert(update.id) {
            return Err(OrderingError::DuplicateId(update.id));
        }
    }

    Ok(())
}

/// Position for a newly appended sibling
///
/// The position is the number of siblings that already exist, not `max + 1`.
/// After deletions this can collide with an existing position; the id
/// tie-break keeps the listing deterministic.
///
/// # Errors
///
/// Returns `OrderingError::PositionOverflow` if the count does not fit in `i32`
pub fn append_position(sibling_count: i64) -> Result<i32, OrderingError> {
    i32::try_from(sibling_count).map_err(|_| OrderingError::PositionOverflow(sibling_count))
}

/// Sorts by position ascending, then by id ascending
///
/// # Example
///
/// ```
/// use taskdeck_shared::ordering::{sort_by_position, Positioned};
///
/// #[derive(Debug)]
/// struct Item(i64, i32);
///
/// impl Positioned for Item {
///     fn entity_id(&self) -> i64 { self.0 }
///     fn position(&self) -> i32 { self.1 }
///     fn set_position(&mut self, position: i32) { self.1 = position; }
/// }
///
/// let mut items = vec![Item(3, 1), Item(2, 1), Item(1, 5)];
/// sort_by_position(&mut items);
/// let ids: Vec<i64> = items.iter().map(|i| i.0).collect();
/// assert_eq!(ids, vec![2, 3, 1]);
/// ```
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| (item.position(), item.entity_id()));
}

/// Rewrites positions to `base, base + 1, ...` in slice order
pub fn renumber_from<T: Positioned>(items: &mut [T], base: i32) {
    for (offset, item) in items.iter_mut().enumerate() {
        item.set_position(base.saturating_add(offset as i32));
    }
}

/// Moves the element at `from` to index `to`, shifting the others
///
/// Returns `false` and leaves the slice untouched when either index is out of
/// bounds.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

/// Builds the reorder payload describing the current slice positions
pub fn order_updates<T: Positioned>(items: &[T]) -> Vec<OrderUpdate> {
    items
        .iter()
        .map(|item| OrderUpdate {
            id: item.entity_id(),
            order: item.position(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        position: i32,
    }

    impl Positioned for Item {
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

    fn items(pairs: &[(i64, i32)]) -> Vec<Item> {
        pairs
            .iter()
            .map(|&(id, position)| Item { id, position })
            .collect()
    }

    fn ids(items: &[Item]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_validate_batch_rejects_empty() {
        assert!(matches!(validate_batch(&[]), Err(OrderingError::EmptyBatch)));
    }

    #[test]
    fn test_validate_batch_rejects_duplicates() {
        let batch = [
            OrderUpdate { id: 4, order: 0 },
            OrderUpdate { id: 5, order: 1 },
            OrderUpdate { id: 4, order: 2 },
        ];
        assert!(matches!(
            validate_batch(&batch),
            Err(OrderingError::DuplicateId(4))
        ));
    }

    #[test]
    fn test_validate_batch_accepts_ties_and_gaps() {
        let batch = [
            OrderUpdate { id: 1, order: 10 },
            OrderUpdate { id: 2, order: 10 },
            OrderUpdate { id: 3, order: -7 },
        ];
        assert!(validate_batch(&batch).is_ok());
    }

    #[test]
    fn test_append_position_is_sibling_count() {
        assert_eq!(append_position(0).unwrap(), 0);
        assert_eq!(append_position(3).unwrap(), 3);
        assert!(matches!(
            append_position(i64::from(i32::MAX) + 1),
            Err(OrderingError::PositionOverflow(_))
        ));
    }

    #[test]
    fn test_sort_breaks_ties_by_id() {
        let mut list = items(&[(5, 2), (3, 0), (9, 2), (1, 2), (7, 0)]);
        sort_by_position(&mut list);
        assert_eq!(ids(&list), vec![3, 7, 1, 5, 9]);
    }

    #[test]
    fn test_sort_is_deterministic_after_delete_and_append() {
        // A,B,C at 0,1,2; delete B; append D at count=2, tying with C
        let mut list = items(&[(1, 0), (3, 2), (4, 2)]);
        sort_by_position(&mut list);
        let first = ids(&list);

        list.reverse();
        sort_by_position(&mut list);
        assert_eq!(ids(&list), first);
        assert_eq!(first, vec![1, 3, 4]);
    }

    #[test]
    fn test_move_and_renumber() {
        let mut list = items(&[(1, 0), (2, 1), (3, 2)]);
        assert!(move_item(&mut list, 2, 0));
        renumber_from(&mut list, 0);

        assert_eq!(
            order_updates(&list),
            vec![
                OrderUpdate { id: 3, order: 0 },
                OrderUpdate { id: 1, order: 1 },
                OrderUpdate { id: 2, order: 2 },
            ]
        );
    }

    #[test]
    fn test_renumber_from_page_offset() {
        let mut list = items(&[(8, 0), (9, 0)]);
        renumber_from(&mut list, 10);
        assert_eq!(list[0].position, 10);
        assert_eq!(list[1].position, 11);
    }

    #[test]
    fn test_move_out_of_bounds_is_noop() {
        let mut list = items(&[(1, 0), (2, 1)]);
        assert!(!move_item(&mut list, 0, 5));
        assert!(!move_item(&mut list, 2, 0));
        assert_eq!(ids(&list), vec![1, 2]);
    }
}
