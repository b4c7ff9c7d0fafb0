//! Optimistic local mutation with best-effort remote persistence.
//!
//! A [`Command`] rewrites the local list immediately and yields the writes
//! needed to persist it. The writes are issued concurrently; if any fails the
//! list is reloaded from the store, and if the reload fails too the local list
//! goes back to what it was before the command.

use std::future::Future;

use futures::future::join_all;

use crate::error::SourceError;
use crate::ordering::{reorder, sort_order_updates, OrderedItem, SortOrderUpdate};

/// The authoritative copy of a list.
pub trait CanonicalStore {
    type Item: Clone + Send + Sync;
    type Write: Send;

    /// Fetch the whole collection in display order.
    fn reload(&self) -> impl Future<Output = Result<Vec<Self::Item>, SourceError>> + Send;

    fn write(&self, write: Self::Write) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// A local edit plus the writes that persist it.
pub trait Command<T> {
    type Write;

    /// `None` when the command does not change anything.
    fn apply(&self, items: &[T]) -> Option<(Vec<T>, Vec<Self::Write>)>;
}

/// Move one item onto another item's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder<Id> {
    pub source: Id,
    pub target: Id,
}

impl<T> Command<T> for Reorder<T::Id>
where
    T: OrderedItem + Clone,
{
    type Write = SortOrderUpdate<T::Id>;

    fn apply(&self, items: &[T]) -> Option<(Vec<T>, Vec<Self::Write>)> {
        let next = reorder(items, &self.source, &self.target)?;
        let writes = sort_order_updates(&next);
        Some((next, writes))
    }
}

#[derive(Debug)]
pub enum CommitOutcome {
    /// Every write succeeded.
    Applied,
    /// The command was a no-op; nothing was written.
    Unchanged,
    /// A write failed; the list now mirrors the store again.
    Reverted(SourceError),
}

impl CommitOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied)
    }
}

pub struct OptimisticList<S: CanonicalStore> {
    store: S,
    items: Vec<S::Item>,
}

impl<S: CanonicalStore> OptimisticList<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            items: Vec::new(),
        }
    }

    /// Replace the local list with the store's.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the local list is left untouched.
    pub async fn load(&mut self) -> Result<(), SourceError> {
        self.items = self.store.reload().await?;
        Ok(())
    }

    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `command` locally, then persist it.
    ///
    /// # Errors
    ///
    /// Returns the reload error when a write failed and the follow-up reload
    /// failed as well. The local list is then restored to its state before
    /// the command.
    pub async fn execute<C>(&mut self, command: &C) -> Result<CommitOutcome, SourceError>
    where
        C: Command<S::Item, Write = S::Write>,
    {
        let Some((next, writes)) = command.apply(&self.items) else {
            return Ok(CommitOutcome::Unchanged);
        };

        let previous = std::mem::replace(&mut self.items, next);
        let write_count = writes.len();
        let results = join_all(writes.into_iter().map(|w| self.store.write(w))).await;

        let Some(err) = results.into_iter().find_map(Result::err) else {
            tracing::debug!(writes = write_count, "optimistic update persisted");
            return Ok(CommitOutcome::Applied);
        };

        tracing::warn!(error = %err, "persisting update failed, reloading from store");
        match self.store.reload().await {
            Ok(items) => {
                self.items = items;
                Ok(CommitOutcome::Reverted(err))
            }
            Err(reload_err) => {
                tracing::warn!(error = %reload_err, "reload failed, restoring previous list");
                self.items = previous;
                Err(reload_err)
            }
        }
    }
}
