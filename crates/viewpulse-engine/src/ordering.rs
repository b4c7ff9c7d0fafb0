//! Dense, zero-based display ordering for user-arranged lists.

use std::fmt::Debug;

use serde::Serialize;
use uuid::Uuid;
use viewpulse_core::Embed;

/// An entity positioned by an integer `sort_order`.
pub trait OrderedItem {
    type Id: Clone + PartialEq + Debug + Send + Sync;

    fn id(&self) -> &Self::Id;
    fn sort_order(&self) -> i32;
    fn set_sort_order(&mut self, sort_order: i32);
}

impl OrderedItem for Embed {
    type Id = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: i32) {
        self.sort_order = sort_order;
    }
}

/// A single persisted position change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrderUpdate<Id> {
    pub id: Id,
    pub sort_order: i32,
}

/// Stable sort into display order.
pub fn sort_for_display<T: OrderedItem>(items: &mut [T]) {
    items.sort_by_key(T::sort_order);
}

/// Assign each item its index as `sort_order`.
pub fn renumber<T: OrderedItem>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_sort_order(i32::try_from(index).unwrap_or(i32::MAX));
    }
}

/// Move `source` to the position currently held by `target`.
///
/// `items` must be in display order. Returns `None` when the ids are equal or
/// either is absent; otherwise the new list with `sort_order` renumbered
/// `0..n`.
#[must_use]
pub fn reorder<T>(items: &[T], source: &T::Id, target: &T::Id) -> Option<Vec<T>>
where
    T: OrderedItem + Clone,
{
    if source == target {
        return None;
    }
    let from = items.iter().position(|item| item.id() == source)?;
    let to = items.iter().position(|item| item.id() == target)?;

    let mut next = items.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    renumber(&mut next);
    Some(next)
}

/// One update per item carrying its current `sort_order`.
#[must_use]
pub fn sort_order_updates<T: OrderedItem>(items: &[T]) -> Vec<SortOrderUpdate<T::Id>> {
    items
        .iter()
        .map(|item| SortOrderUpdate {
            id: item.id().clone(),
            sort_order: item.sort_order(),
        })
        .collect()
}
