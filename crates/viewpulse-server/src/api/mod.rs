mod embeds;
mod export;
mod milestones;
mod monitor;

pub(crate) use monitor::load_monitor_inputs;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use viewpulse_engine::range::{RangeTooWide, UnknownRange};
use viewpulse_engine::{MonitorSettings, RangeKey, RangeSelection, RangeWindow, SourceError};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<MonitorSettings>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// `?range=` preset or `?from=&to=` custom dates; explicit dates win.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RangeQuery {
    pub range: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl RangeQuery {
    pub(super) fn selection(&self, default: RangeKey) -> Result<RangeSelection, UnknownRange> {
        if self.from.is_some() || self.to.is_some() {
            return Ok(RangeSelection::Custom {
                since: self.from,
                until: self.to,
            });
        }
        match self.range.as_deref().map(str::trim) {
            None | Some("") => Ok(RangeSelection::Relative(default)),
            Some(raw) => raw.parse().map(RangeSelection::Relative),
        }
    }

    /// Parses and resolves against `now`; custom ranges wider than 30 days
    /// are rejected before any query runs.
    pub(super) fn bounded(
        &self,
        default: RangeKey,
        now: DateTime<Utc>,
        request_id: &str,
    ) -> Result<(RangeSelection, RangeWindow), ApiError> {
        let selection = self
            .selection(default)
            .map_err(|e| range_error(request_id.to_string(), &e))?;
        let window = selection
            .resolve_bounded(now)
            .map_err(|e| span_error(request_id.to_string(), &e))?;
        Ok((selection, window))
    }
}

fn range_error(request_id: String, error: &UnknownRange) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

fn span_error(request_id: String, error: &RangeTooWide) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

pub(super) fn map_db_error(request_id: String, error: &viewpulse_db::DbError) -> ApiError {
    if matches!(error, viewpulse_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_source_error(request_id: String, error: &SourceError) -> ApiError {
    match error {
        SourceError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        SourceError::Invalid(message) => ApiError::new(request_id, "validation_error", message),
        SourceError::Query(_) => {
            tracing::error!(error = %error, "store operation failed");
            ApiError::new(request_id, "internal_error", "store operation failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Read routes plus click recording; open to anonymous viewers.
fn read_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/monitor/summary", get(monitor::summary))
        .route("/api/v1/monitor/chart", get(monitor::chart))
        .route("/api/v1/monitor/buckets", get(monitor::buckets))
        .route("/api/v1/milestones", get(milestones::list_milestones))
        .route(
            "/api/v1/milestones/history",
            get(milestones::milestone_history),
        )
        .route("/api/v1/embeds/analytics", get(embeds::click_analytics))
        .route("/api/v1/embeds/{id}/clicks", post(embeds::record_click))
        .route("/api/v1/export", get(export::export_csv))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

/// Admin writes; require a bearer token when auth is enabled.
fn write_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/milestones", post(milestones::create_milestone))
        .route(
            "/api/v1/milestones/{id}",
            patch(milestones::update_milestone).delete(milestones::delete_milestone),
        )
        .route("/api/v1/embeds/reorder", put(embeds::reorder_embeds))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(read_router(rate_limit.clone()))
        .merge(write_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match viewpulse_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use tower::ServiceExt;
    use uuid::Uuid;
    use viewpulse_db::{insert_embed, insert_snapshot, list_embeds, NewSnapshot};

    fn app_with_auth(pool: PgPool, auth: AuthState) -> Router {
        build_app(
            AppState {
                pool,
                settings: Arc::new(MonitorSettings::default()),
            },
            auth,
            default_rate_limit_state(),
        )
    }

    fn app_for(pool: PgPool) -> Router {
        app_with_auth(pool, AuthState::disabled())
    }

    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://viewpulse@127.0.0.1:1/unused").expect("lazy pool")
    }

    /// A pool that never connects; for requests rejected before any query.
    fn offline_app() -> Router {
        app_for(lazy_pool())
    }

    fn guarded_offline_app() -> Router {
        let auth = AuthState::from_keys(&["admin-token".to_string()], false).expect("auth");
        app_with_auth(lazy_pool(), auth)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn send_json(
        app: Router,
        method: Method,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn seed_recent_views(pool: &PgPool, views: &[i64]) {
        let now = Utc::now();
        let count = i64::try_from(views.len()).expect("small");
        for (i, v) in views.iter().enumerate() {
            let offset = count - i64::try_from(i).expect("small");
            insert_snapshot(
                pool,
                &NewSnapshot {
                    captured_at: now - ChronoDuration::minutes(offset * 5),
                    views: Some(*v),
                    likes: Some(v / 10),
                    comments: Some(v / 100),
                    views_per_hour: None,
                },
            )
            .await
            .expect("insert snapshot");
        }
    }

    // -------------------------------------------------------------------------
    // Envelope and query parsing
    // -------------------------------------------------------------------------

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("not_found", StatusCode::NOT_FOUND),
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("conflict", StatusCode::CONFLICT),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[test]
    fn range_query_defaults_and_parses_presets() {
        let query = RangeQuery::default();
        assert_eq!(
            query.selection(RangeKey::Days7),
            Ok(RangeSelection::Relative(RangeKey::Days7))
        );

        let query = RangeQuery {
            range: Some("24h".to_string()),
            ..RangeQuery::default()
        };
        assert_eq!(
            query.selection(RangeKey::Days7),
            Ok(RangeSelection::Relative(RangeKey::Day1))
        );

        let query = RangeQuery {
            range: Some("2w".to_string()),
            ..RangeQuery::default()
        };
        assert!(query.selection(RangeKey::Days7).is_err());
    }

    #[test]
    fn explicit_dates_override_preset_range() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let query = RangeQuery {
            range: Some("1h".to_string()),
            from: Some(from),
            to: None,
        };
        assert_eq!(
            query.selection(RangeKey::Day1),
            Ok(RangeSelection::Custom {
                since: Some(from),
                until: None
            })
        );
    }

    #[test]
    fn source_errors_map_to_api_codes() {
        let not_found = map_source_error("r".to_string(), &SourceError::NotFound);
        assert_eq!(not_found.error.code, "not_found");

        let invalid = map_source_error("r".to_string(), &SourceError::Invalid("bad".to_string()));
        assert_eq!(invalid.error.code, "validation_error");
        assert_eq!(invalid.error.message, "bad");
    }

    #[test]
    fn bounded_range_rejects_wide_custom_windows() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let query = RangeQuery {
            range: None,
            from: Some(Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap()),
        };
        let err = query
            .bounded(RangeKey::Days7, now, "r")
            .expect_err("too wide");
        assert_eq!(err.error.code, "validation_error");

        let month = RangeQuery {
            range: None,
            from: Some(now - ChronoDuration::days(30)),
            to: Some(now),
        };
        let (_, window) = month.bounded(RangeKey::Days7, now, "r").expect("within bound");
        assert_eq!(window.until, now);
    }

    #[tokio::test]
    async fn wide_analytics_range_is_rejected_before_querying() {
        let (status, json) = get_json(
            offline_app(),
            "/api/v1/embeds/analytics?from=0001-01-01T00:00:00Z&to=9999-01-01T00:00:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn wide_bucket_range_is_rejected_before_querying() {
        let (status, _) = get_json(
            offline_app(),
            "/api/v1/monitor/buckets?from=2020-01-01T00:00:00Z&to=2026-01-01T00:00:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_range_is_rejected_before_querying() {
        let (status, json) = get_json(offline_app(), "/api/v1/monitor/buckets?range=2w").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn export_rejects_non_export_ranges() {
        let (status, json) = get_json(offline_app(), "/api/v1/export?range=30d").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn milestone_with_blank_title_is_rejected() {
        let (status, json) = send_json(
            offline_app(),
            Method::POST,
            "/api/v1/milestones",
            serde_json::json!({ "title": "  ", "target_count": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn milestone_writes_require_a_bearer_token() {
        let (status, json) = send_json(
            guarded_offline_app(),
            Method::POST,
            "/api/v1/milestones",
            serde_json::json!({ "title": "1M", "target_count": 1_000_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "unauthorized");

        let id = Uuid::new_v4();
        for method in [Method::PATCH, Method::DELETE] {
            let (status, _) = send_json(
                guarded_offline_app(),
                method.clone(),
                &format!("/api/v1/milestones/{id}"),
                serde_json::json!({ "is_active": false }),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method}");
        }
    }

    #[tokio::test]
    async fn reorder_requires_a_bearer_token() {
        let (status, _) = send_json(
            guarded_offline_app(),
            Method::PUT,
            "/api/v1/embeds/reorder",
            serde_json::json!({ "source_id": Uuid::new_v4(), "target_id": Uuid::new_v4() }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authorized_write_reaches_validation() {
        let response = guarded_offline_app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/milestones")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer admin-token")
                    .body(Body::from(
                        serde_json::json!({ "title": " ", "target_count": 10 }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reads_stay_public_when_auth_is_enabled() {
        let (status, json) =
            get_json(guarded_offline_app(), "/api/v1/monitor/buckets?range=2w").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok(pool: PgPool) {
        let (status, json) = get_json(app_for(pool), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["database"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn summary_reports_latest_counts_and_next_milestone(pool: PgPool) {
        seed_recent_views(&pool, &[1_000, 1_500, 2_000]).await;
        sqlx::query(
            "INSERT INTO milestones (title, target_count, sort_order) VALUES ('5K', 5000, 0)",
        )
        .execute(&pool)
        .await
        .expect("insert milestone");

        let (status, json) = get_json(app_for(pool), "/api/v1/monitor/summary?range=1h").await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["current_views"].as_i64(), Some(2_000));
        assert_eq!(data["likes"].as_i64(), Some(200));
        assert_eq!(data["next_milestone"]["remaining"].as_i64(), Some(3_000));
        assert!(data["rate_per_second"].as_f64().expect("rate") > 0.0);
        assert!(data["chart"].is_object());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn chart_is_null_without_enough_snapshots(pool: PgPool) {
        seed_recent_views(&pool, &[1_000]).await;
        let (status, json) = get_json(app_for(pool), "/api/v1/monitor/chart").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn milestone_crud_round_trip(pool: PgPool) {
        let app = app_for(pool);
        let (status, created) = send_json(
            app.clone(),
            Method::POST,
            "/api/v1/milestones",
            serde_json::json!({ "title": "100K", "target_count": 100_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_str().expect("id").to_string();

        let (status, _) = send_json(
            app.clone(),
            Method::PATCH,
            &format!("/api/v1/milestones/{id}"),
            serde_json::json!({ "target_count": 150_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = get_json(app.clone(), "/api/v1/milestones").await;
        let rows = listed["data"]["milestones"].as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["milestone"]["target_count"].as_i64(), Some(150_000));
        assert_eq!(rows[0]["status"], "pending");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/v1/milestones/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = send_json(
            app,
            Method::PATCH,
            &format!("/api/v1/milestones/{id}"),
            serde_json::json!({ "is_active": false }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn reorder_moves_embed_and_returns_new_order(pool: PgPool) {
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            ids.push(
                insert_embed(&pool, title, "https://x.example", None)
                    .await
                    .expect("insert embed")
                    .id,
            );
        }

        let (status, json) = send_json(
            app_for(pool.clone()),
            Method::PUT,
            "/api/v1/embeds/reorder",
            serde_json::json!({ "source_id": ids[2], "target_id": ids[0] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = json["data"]
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|e| e["title"].as_str())
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);

        let stored = list_embeds(&pool).await.expect("list");
        assert_eq!(stored[0].id, ids[2]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn clicks_are_recorded_and_ranked(pool: PgPool) {
        let a = insert_embed(&pool, "a", "https://a.example", None).await.expect("a");
        let b = insert_embed(&pool, "b", "https://b.example", None).await.expect("b");
        let app = app_for(pool);

        for _ in 0..2 {
            let (status, _) = send_json(
                app.clone(),
                Method::POST,
                &format!("/api/v1/embeds/{}/clicks", b.id),
                serde_json::json!({}),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, _) = send_json(
            app.clone(),
            Method::POST,
            &format!("/api/v1/embeds/{}/clicks", Uuid::new_v4()),
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = get_json(app, "/api/v1/embeds/analytics?range=1d").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_clicks"].as_u64(), Some(2));
        let ranked = json["data"]["ranked"].as_array().expect("ranked");
        assert_eq!(ranked[0]["id"], b.id.to_string());
        assert_eq!(ranked[1]["id"], a.id.to_string());
        assert_eq!(ranked[1]["clicks"].as_u64(), Some(0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn export_returns_csv_attachment(pool: PgPool) {
        seed_recent_views(&pool, &[10, 20]).await;

        let response = app_for(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/export?range=1h")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .expect("disposition")
            .to_string();
        assert!(disposition.contains("monitoring-1h-"));

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("captured_at,views,likes,comments,views_per_hour")
        );
        assert_eq!(lines.count(), 2);
    }
}
