use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use viewpulse_core::{Milestone, MilestoneUpdate, NewMilestone, Snapshot};
use viewpulse_db::MilestoneStore;
use viewpulse_engine::crossing::current_views;
use viewpulse_engine::{
    estimate_rate, milestone_progress, threshold_ledger, LedgerRow, Metric, MilestoneProgress,
    MilestoneSource, LEDGER_STEP,
};

use crate::middleware::RequestId;

use super::monitor::load_monitor_inputs;
use super::{map_db_error, map_source_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateMilestoneRequest {
    pub title: String,
    pub target_count: i64,
    #[serde(default)]
    pub current_count: i64,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct MilestoneList {
    current_views: i64,
    rate_per_second: f64,
    milestones: Vec<MilestoneProgress>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_title(req_id: &str, title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "title must be 1 to 200 characters",
        ));
    }
    Ok(title.to_owned())
}

fn validate_count(req_id: &str, field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("{field} must not be negative, got {value}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/milestones: active milestones with progress and ETA.
pub(super) async fn list_milestones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<MilestoneList>>, ApiError> {
    let (snapshots, milestones) = load_monitor_inputs(&state.pool, state.settings.snapshot_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let current = current_views(&snapshots, &milestones);
    let rate = estimate_rate(&snapshots, Metric::Views);

    Ok(Json(ApiResponse {
        data: MilestoneList {
            current_views: current,
            rate_per_second: rate,
            milestones: milestone_progress(&milestones, &snapshots, current, rate),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/milestones/history: round-number thresholds already passed.
pub(super) async fn milestone_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<LedgerRow>>>, ApiError> {
    let rows = viewpulse_db::list_recent_snapshots(&state.pool, state.settings.snapshot_limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let snapshots: Vec<Snapshot> = rows.into_iter().map(Snapshot::from).collect();

    Ok(Json(ApiResponse {
        data: threshold_ledger(&snapshots, LEDGER_STEP),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/milestones
pub(super) async fn create_milestone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateMilestoneRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Milestone>>), ApiError> {
    let rid = &req_id.0;
    let title = validate_title(rid, &body.title)?;
    validate_count(rid, "target_count", body.target_count)?;
    validate_count(rid, "current_count", body.current_count)?;

    let created = MilestoneStore::new(state.pool.clone())
        .insert(&NewMilestone {
            title,
            target_count: body.target_count,
            current_count: body.current_count,
            sort_order: body.sort_order,
            is_active: body.is_active,
        })
        .await
        .map_err(|e| map_source_error(rid.clone(), &e))?;

    tracing::info!(milestone = %created.id, target = created.target_count, "milestone created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: created,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/milestones/{id}: sparse update.
pub(super) async fn update_milestone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(mut body): Json<MilestoneUpdate>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    if body.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "no fields to update"));
    }
    if let Some(title) = body.title.take() {
        body.title = Some(validate_title(rid, &title)?);
    }
    if let Some(target) = body.target_count {
        validate_count(rid, "target_count", target)?;
    }
    if let Some(current) = body.current_count {
        validate_count(rid, "current_count", current)?;
    }

    MilestoneStore::new(state.pool.clone())
        .update(id, &body)
        .await
        .map_err(|e| map_source_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "updated": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/milestones/{id}
pub(super) async fn delete_milestone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    MilestoneStore::new(state.pool.clone())
        .delete(id)
        .await
        .map_err(|e| map_source_error(req_id.0.clone(), &e))?;

    tracing::info!(milestone = %id, "milestone deleted");
    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_fills_defaults() {
        let body: CreateMilestoneRequest =
            serde_json::from_str(r#"{"title":"1M","target_count":1000000}"#).expect("parse");
        assert_eq!(body.current_count, 0);
        assert_eq!(body.sort_order, 0);
        assert!(body.is_active);
    }

    #[test]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(validate_title("r", "  1M  ").expect("valid"), "1M");
        assert!(validate_title("r", "   ").is_err());
        assert!(validate_title("r", &"x".repeat(201)).is_err());
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(validate_count("r", "target_count", -1).is_err());
        assert!(validate_count("r", "target_count", 0).is_ok());
    }
}
