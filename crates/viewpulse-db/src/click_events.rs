//! Database operations for the append-only `embed_click_events` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viewpulse_core::ClickEvent;

use crate::DbError;

/// A row from the `embed_click_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClickEventRow {
    pub id: i64,
    pub embed_id: Uuid,
    pub clicked_at: DateTime<Utc>,
}

impl From<ClickEventRow> for ClickEvent {
    fn from(row: ClickEventRow) -> Self {
        ClickEvent {
            item_id: row.embed_id,
            clicked_at: row.clicked_at,
        }
    }
}

/// Returns clicks at or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_click_events_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<ClickEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ClickEventRow>(
        "SELECT id, embed_id, clicked_at \
         FROM embed_click_events \
         WHERE clicked_at >= $1 \
         ORDER BY clicked_at ASC, id ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Records one click.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the embed does not exist, or
/// [`DbError::Sqlx`] if the insert fails for any other reason.
pub async fn insert_click_event(
    pool: &PgPool,
    embed_id: Uuid,
    clicked_at: DateTime<Utc>,
) -> Result<ClickEventRow, DbError> {
    let result = sqlx::query_as::<_, ClickEventRow>(
        "INSERT INTO embed_click_events (embed_id, clicked_at) \
         VALUES ($1, $2) \
         RETURNING id, embed_id, clicked_at",
    )
    .bind(embed_id)
    .bind(clicked_at)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(DbError::NotFound),
        Err(e) => Err(e.into()),
    }
}
