//! Query seams over the external store.
//!
//! The engine never talks to a database directly; `viewpulse-db` implements
//! these traits for Postgres and tests use in-memory fakes.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use viewpulse_core::{ClickEvent, Milestone, MilestoneUpdate, NewMilestone, Snapshot};

use crate::error::SourceError;

/// Read access to the snapshot history.
pub trait SnapshotSource {
    /// Most recent `limit` snapshots, returned in ascending `captured_at` order.
    fn list_recent(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Snapshot>, SourceError>> + Send;

    /// Every snapshot with `captured_at >= cutoff`, ascending.
    fn list_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Snapshot>, SourceError>> + Send;
}

/// Milestone definitions.
pub trait MilestoneSource {
    /// Active milestones ordered by `sort_order`, then `created_at`.
    fn list_active(&self) -> impl Future<Output = Result<Vec<Milestone>, SourceError>> + Send;

    fn insert(
        &self,
        milestone: &NewMilestone,
    ) -> impl Future<Output = Result<Milestone, SourceError>> + Send;

    fn update(
        &self,
        id: Uuid,
        update: &MilestoneUpdate,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Append-only click log for embed items.
pub trait ClickEventSource {
    fn list_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ClickEvent>, SourceError>> + Send;

    fn insert(&self, event: &ClickEvent) -> impl Future<Output = Result<(), SourceError>> + Send;
}
