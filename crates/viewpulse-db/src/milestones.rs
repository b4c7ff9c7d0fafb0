//! Database operations for the `milestones` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viewpulse_core::{Milestone, MilestoneUpdate, NewMilestone};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `milestones` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MilestoneRow {
    pub id: Uuid,
    pub title: String,
    pub target_count: i64,
    pub current_count: i64,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MilestoneRow> for Milestone {
    fn from(row: MilestoneRow) -> Self {
        Milestone {
            id: row.id,
            title: row.title,
            target_count: row.target_count,
            current_count: row.current_count,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str =
    "id, title, target_count, current_count, sort_order, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns active milestones ordered by `sort_order`, then `created_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_milestones(pool: &PgPool) -> Result<Vec<MilestoneRow>, DbError> {
    let rows = sqlx::query_as::<_, MilestoneRow>(&format!(
        "SELECT {COLUMNS} FROM milestones \
         WHERE is_active = true \
         ORDER BY sort_order ASC, created_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates a milestone and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_milestone(pool: &PgPool, new: &NewMilestone) -> Result<MilestoneRow, DbError> {
    let row = sqlx::query_as::<_, MilestoneRow>(&format!(
        "INSERT INTO milestones (title, target_count, current_count, sort_order, is_active) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {COLUMNS}"
    ))
    .bind(&new.title)
    .bind(new.target_count)
    .bind(new.current_count)
    .bind(new.sort_order)
    .bind(new.is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a partial update; `None` fields keep their stored value.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no milestone has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_milestone(
    pool: &PgPool,
    id: Uuid,
    update: &MilestoneUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE milestones \
         SET title = COALESCE($2, title), \
             target_count = COALESCE($3, target_count), \
             current_count = COALESCE($4, current_count), \
             sort_order = COALESCE($5, sort_order), \
             is_active = COALESCE($6, is_active), \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(update.title.as_deref())
    .bind(update.target_count)
    .bind(update.current_count)
    .bind(update.sort_order)
    .bind(update.is_active)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Deletes a milestone.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no milestone has the given `id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_milestone(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
