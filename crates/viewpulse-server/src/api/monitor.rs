//! Live dashboard views: summary, chart and the hourly bucket table.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use viewpulse_core::{Milestone, Snapshot};
use viewpulse_engine::bucket::hourly;
use viewpulse_engine::monitor::summarize;
use viewpulse_engine::{
    bucket_table, build_chart, BucketRow, ChartModel, DismissalState, MonitorSettings,
    MonitorView, RangeKey, RangeWindow, TABLE_ROWS,
};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, RangeQuery, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BucketTable {
    range: RangeWindow,
    generated_at: DateTime<Utc>,
    rows: Vec<BucketRow>,
}

/// Most recent snapshots plus active milestones, loaded concurrently.
pub(crate) async fn load_monitor_inputs(
    pool: &PgPool,
    limit: i64,
) -> Result<(Vec<Snapshot>, Vec<Milestone>), viewpulse_db::DbError> {
    let (snapshots, milestones) = tokio::try_join!(
        viewpulse_db::list_recent_snapshots(pool, limit),
        viewpulse_db::list_active_milestones(pool),
    )?;
    Ok((
        snapshots.into_iter().map(Snapshot::from).collect(),
        milestones.into_iter().map(Milestone::from).collect(),
    ))
}

/// GET /api/v1/monitor/summary
///
/// Dismissals live on the client, so the notification here is the raw
/// recent crossing.
pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<MonitorView>>, ApiError> {
    let (range, _) = query.bounded(RangeKey::Day1, Utc::now(), &req_id.0)?;

    let (snapshots, milestones) = load_monitor_inputs(&state.pool, state.settings.snapshot_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let settings = MonitorSettings {
        range,
        ..(*state.settings).clone()
    };
    let view = summarize(
        &snapshots,
        &milestones,
        &DismissalState::default(),
        &settings,
        None,
        Utc::now(),
    );

    Ok(Json(ApiResponse {
        data: view,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/monitor/chart
pub(super) async fn chart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Option<ChartModel>>>, ApiError> {
    let rows = viewpulse_db::list_recent_snapshots(&state.pool, state.settings.snapshot_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let snapshots: Vec<Snapshot> = rows.into_iter().map(Snapshot::from).collect();

    Ok(Json(ApiResponse {
        data: build_chart(&snapshots, Utc::now(), &state.settings.chart),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/monitor/buckets
pub(super) async fn buckets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<BucketTable>>, ApiError> {
    let now = Utc::now();
    let (_, window) = query.bounded(RangeKey::Day1, now, &req_id.0)?;

    let rows = viewpulse_db::list_snapshots_since(&state.pool, window.since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let snapshots: Vec<Snapshot> = rows.into_iter().map(Snapshot::from).collect();

    Ok(Json(ApiResponse {
        data: BucketTable {
            rows: bucket_table(&snapshots, &window, hourly(), TABLE_ROWS),
            range: window,
            generated_at: now,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
