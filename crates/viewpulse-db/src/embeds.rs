//! Database operations for the `embeds` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viewpulse_core::Embed;

use crate::DbError;

/// A row from the `embeds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbedRow {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EmbedRow> for Embed {
    fn from(row: EmbedRow) -> Self {
        Embed {
            id: row.id,
            title: row.title,
            url: row.url,
            thumbnail_url: row.thumbnail_url,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

/// Returns every embed in display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_embeds(pool: &PgPool) -> Result<Vec<EmbedRow>, DbError> {
    let rows = sqlx::query_as::<_, EmbedRow>(
        "SELECT id, title, url, thumbnail_url, sort_order, is_active, created_at \
         FROM embeds \
         ORDER BY sort_order ASC, created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates an embed at the end of the list and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_embed(
    pool: &PgPool,
    title: &str,
    url: &str,
    thumbnail_url: Option<&str>,
) -> Result<EmbedRow, DbError> {
    let row = sqlx::query_as::<_, EmbedRow>(
        "INSERT INTO embeds (title, url, thumbnail_url, sort_order) \
         VALUES ($1, $2, $3, (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM embeds)) \
         RETURNING id, title, url, thumbnail_url, sort_order, is_active, created_at",
    )
    .bind(title)
    .bind(url)
    .bind(thumbnail_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Sets `sort_order` for one embed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no embed has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_embed_sort_order(
    pool: &PgPool,
    id: Uuid,
    sort_order: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE embeds \
         SET sort_order = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(sort_order)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
