//! Postgres implementations of the engine's source traits.
//!
//! Each adapter is a thin wrapper around a cloned [`PgPool`]; query errors
//! become [`SourceError`] at this boundary.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viewpulse_core::{ClickEvent, Embed, Milestone, MilestoneUpdate, NewMilestone, Snapshot};
use viewpulse_engine::{
    CanonicalStore, ClickEventSource, MilestoneSource, SnapshotSource, SortOrderUpdate,
    SourceError,
};

use crate::{click_events, embeds, milestones, snapshots};

macro_rules! pg_adapter {
    ($name:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pool: PgPool,
        }

        impl $name {
            #[must_use]
            pub fn new(pool: PgPool) -> Self {
                Self { pool }
            }

            #[must_use]
            pub fn pool(&self) -> &PgPool {
                &self.pool
            }
        }
    };
}

pg_adapter!(SnapshotStore);
pg_adapter!(MilestoneStore);
pg_adapter!(ClickEventStore);
pg_adapter!(EmbedStore);

impl SnapshotSource for SnapshotStore {
    async fn list_recent(&self, limit: i64) -> Result<Vec<Snapshot>, SourceError> {
        let rows = snapshots::list_recent_snapshots(&self.pool, limit).await?;
        Ok(rows.into_iter().map(Snapshot::from).collect())
    }

    async fn list_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Snapshot>, SourceError> {
        let rows = snapshots::list_snapshots_since(&self.pool, cutoff).await?;
        Ok(rows.into_iter().map(Snapshot::from).collect())
    }
}

impl MilestoneSource for MilestoneStore {
    async fn list_active(&self) -> Result<Vec<Milestone>, SourceError> {
        let rows = milestones::list_active_milestones(&self.pool).await?;
        Ok(rows.into_iter().map(Milestone::from).collect())
    }

    async fn insert(&self, milestone: &NewMilestone) -> Result<Milestone, SourceError> {
        let row = milestones::insert_milestone(&self.pool, milestone).await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, update: &MilestoneUpdate) -> Result<(), SourceError> {
        if update.is_empty() {
            return Ok(());
        }
        milestones::update_milestone(&self.pool, id, update).await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SourceError> {
        milestones::delete_milestone(&self.pool, id).await?;
        Ok(())
    }
}

impl ClickEventSource for ClickEventStore {
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<ClickEvent>, SourceError> {
        let rows = click_events::list_click_events_since(&self.pool, since).await?;
        Ok(rows.into_iter().map(ClickEvent::from).collect())
    }

    async fn insert(&self, event: &ClickEvent) -> Result<(), SourceError> {
        click_events::insert_click_event(&self.pool, event.item_id, event.clicked_at).await?;
        Ok(())
    }
}

impl CanonicalStore for EmbedStore {
    type Item = Embed;
    type Write = SortOrderUpdate<Uuid>;

    async fn reload(&self) -> Result<Vec<Embed>, SourceError> {
        let rows = embeds::list_embeds(&self.pool).await?;
        Ok(rows.into_iter().map(Embed::from).collect())
    }

    async fn write(&self, write: SortOrderUpdate<Uuid>) -> Result<(), SourceError> {
        embeds::update_embed_sort_order(&self.pool, write.id, write.sort_order).await?;
        Ok(())
    }
}
