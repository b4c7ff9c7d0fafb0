//! Database operations for the `monitoring_snapshots` table.
//!
//! Snapshots are written by an external ingest job; the only insert here
//! exists for seeding and tests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use viewpulse_core::Snapshot;
use viewpulse_engine::ExportRow;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `monitoring_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub captured_at: DateTime<Utc>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub views_per_hour: Option<i64>,
}

impl From<SnapshotRow> for Snapshot {
    fn from(row: SnapshotRow) -> Self {
        Snapshot {
            captured_at: row.captured_at,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
        }
    }
}

impl From<SnapshotRow> for ExportRow {
    fn from(row: SnapshotRow) -> Self {
        ExportRow {
            captured_at: row.captured_at,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
            views_per_hour: row.views_per_hour,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSnapshot {
    pub captured_at: DateTime<Utc>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub views_per_hour: Option<i64>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the `limit` most recent snapshots in ascending `captured_at` order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_snapshots(pool: &PgPool, limit: i64) -> Result<Vec<SnapshotRow>, DbError> {
    let mut rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, captured_at, views, likes, comments, views_per_hour \
         FROM monitoring_snapshots \
         ORDER BY captured_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Returns every snapshot captured at or after `cutoff`, ascending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_since(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, captured_at, views, likes, comments, views_per_hour \
         FROM monitoring_snapshots \
         WHERE captured_at >= $1 \
         ORDER BY captured_at ASC, id ASC",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a snapshot and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_snapshot(pool: &PgPool, snapshot: &NewSnapshot) -> Result<SnapshotRow, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "INSERT INTO monitoring_snapshots (captured_at, views, likes, comments, views_per_hour) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, captured_at, views, likes, comments, views_per_hour",
    )
    .bind(snapshot.captured_at)
    .bind(snapshot.views)
    .bind(snapshot.likes)
    .bind(snapshot.comments)
    .bind(snapshot.views_per_hour)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
