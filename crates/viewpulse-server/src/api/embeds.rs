//! Embed click analytics and drag-to-reorder persistence.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use viewpulse_core::{ClickEvent, Embed};
use viewpulse_db::{ClickEventStore, EmbedStore};
use viewpulse_engine::{
    analyze, ClickAnalytics, ClickEventSource, CommitOutcome, OptimisticList, RangeKey, Reorder,
};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_source_error, ApiError, ApiResponse, AppState, RangeQuery,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ReorderRequest {
    pub source_id: Uuid,
    pub target_id: Uuid,
}

/// GET /api/v1/embeds/analytics: clicks per active embed plus a time series.
pub(super) async fn click_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<ClickAnalytics>>, ApiError> {
    let (_, window) = query.bounded(RangeKey::Days7, Utc::now(), &req_id.0)?;

    let (embeds, events) = tokio::try_join!(
        viewpulse_db::list_embeds(&state.pool),
        viewpulse_db::list_click_events_since(&state.pool, window.since),
    )
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items: Vec<Embed> = embeds
        .into_iter()
        .map(Embed::from)
        .filter(|e| e.is_active)
        .collect();
    let events: Vec<ClickEvent> = events.into_iter().map(ClickEvent::from).collect();

    Ok(Json(ApiResponse {
        data: analyze(&items, &events, window),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/embeds/reorder: move `source_id` to `target_id`'s position.
///
/// Responds with the full list in its new order. A failed write yields
/// `409` after the list has been reloaded from the database.
pub(super) async fn reorder_embeds(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<Embed>>>, ApiError> {
    let rid = &req_id.0;
    let mut list = OptimisticList::new(EmbedStore::new(state.pool.clone()));
    list.load()
        .await
        .map_err(|e| map_source_error(rid.clone(), &e))?;

    let command = Reorder {
        source: body.source_id,
        target: body.target_id,
    };
    match list.execute(&command).await {
        Ok(CommitOutcome::Applied | CommitOutcome::Unchanged) => Ok(Json(ApiResponse {
            data: list.items().to_vec(),
            meta: ResponseMeta::new(req_id.0),
        })),
        Ok(CommitOutcome::Reverted(err)) => {
            tracing::warn!(error = %err, source = %body.source_id, "embed reorder reverted");
            Err(ApiError::new(
                rid,
                "conflict",
                "reorder could not be saved; order reloaded",
            ))
        }
        Err(err) => Err(map_source_error(rid.clone(), &err)),
    }
}

/// POST /api/v1/embeds/{id}/clicks
pub(super) async fn record_click(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<ClickEvent>>), ApiError> {
    let event = ClickEvent {
        item_id: id,
        clicked_at: Utc::now(),
    };
    ClickEventStore::new(state.pool.clone())
        .insert(&event)
        .await
        .map_err(|e| map_source_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: event,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
