use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted on mutating routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth settings from the configured `VIEWPULSE_API_KEYS`.
    ///
    /// Without keys, auth is disabled in development and startup fails
    /// everywhere else.
    ///
    /// # Errors
    ///
    /// Returns an error when no keys are configured outside development.
    pub fn from_keys(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "VIEWPULSE_API_KEYS not set; write routes are open in development"
                );
                return Ok(Self::disabled());
            }
            anyhow::bail!("VIEWPULSE_API_KEYS is required outside development");
        }

        Ok(Self {
            api_keys: Arc::new(keys.to_vec()),
            enabled: true,
        })
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_keys: Arc::new(Vec::new()),
            enabled: false,
        }
    }

    /// Compares against every key without short-circuiting.
    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .fold(subtle::Choice::from(0), |found, key| {
                found | key.as_bytes().ct_eq(token.as_bytes())
            })
            .into()
    }
}

#[derive(Debug)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every API route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Counts one request; `false` once the current window is exhausted.
    async fn admit(&self) -> bool {
        let mut window = self.state.lock().await;
        if window.started_at.elapsed() >= self.window {
            window.started_at = Instant::now();
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a new `UUIDv4` is
/// generated. The ID is stored as a [`RequestId`] extension and echoed on the
/// response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Rejects mutating requests without a valid bearer token when auth is enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            let id = req
                .extensions()
                .get::<RequestId>()
                .map_or_else(String::new, |r| r.0.clone());
            tracing::warn!(
                request_id = %id,
                method = %req.method(),
                uri = %req.uri(),
                "rejected unauthenticated write"
            );
            ApiError::new(id, "unauthorized", "missing or invalid bearer token").into_response()
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Rejects requests with `429` once the window's budget is spent.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if rate_limit.admit().await {
        return next.run(req).await;
    }

    let id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |r| r.0.clone());
    tracing::warn!(request_id = %id, uri = %req.uri(), "rate limit exceeded");
    ApiError::new(id, "rate_limited", "rate limit exceeded").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    type HttpRequest = axum::http::Request<Body>;

    fn limited_router(max_requests: usize) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(
                RateLimitState::new(max_requests, Duration::from_secs(60)),
                enforce_rate_limit,
            ))
            .layer(axum::middleware::from_fn(request_id))
    }

    fn ping() -> HttpRequest {
        axum::http::Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn rate_limit_rejects_requests_over_budget() {
        let app = limited_router(1);

        let first = app.clone().oneshot(ping()).await.expect("first");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(ping()).await.expect("second");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn request_id_is_echoed_when_supplied() {
        let app = limited_router(10);
        let req = axum::http::Request::builder()
            .uri("/ping")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .expect("request");

        let res = app.oneshot(req).await.expect("response");
        assert_eq!(
            res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
    }

    #[tokio::test]
    async fn request_id_is_generated_when_missing() {
        let res = limited_router(10).oneshot(ping()).await.expect("response");
        let id = res
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("generated id");
        assert!(Uuid::parse_str(id).is_ok());
    }

    fn guarded_router(auth: AuthState) -> Router {
        Router::new()
            .route("/write", axum::routing::post(|| async { "written" }))
            .layer(axum::middleware::from_fn_with_state(auth, require_bearer_auth))
            .layer(axum::middleware::from_fn(request_id))
    }

    fn write_with(authorization: Option<&str>) -> HttpRequest {
        let mut builder = axum::http::Request::builder().method("POST").uri("/write");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn bearer_token_is_extracted() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));

        let basic = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&basic)), None);

        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&blank)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn auth_is_disabled_without_keys_in_development() {
        let auth = AuthState::from_keys(&[], true).expect("development allows no keys");
        assert!(!auth.enabled);
    }

    #[test]
    fn missing_keys_fail_outside_development() {
        assert!(AuthState::from_keys(&[], false).is_err());
    }

    #[test]
    fn only_configured_keys_are_allowed() {
        let auth = AuthState::from_keys(&keys(&["alpha", "beta"]), false).expect("auth");
        assert!(auth.allows("alpha"));
        assert!(auth.allows("beta"));
        assert!(!auth.allows("alph"));
        assert!(!auth.allows("alphaa"));
        assert!(!auth.allows(""));
    }

    #[tokio::test]
    async fn write_without_token_is_unauthorized() {
        let auth = AuthState::from_keys(&keys(&["secret"]), false).expect("auth");
        let res = guarded_router(auth).oneshot(write_with(None)).await.expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn write_with_wrong_token_is_unauthorized() {
        let auth = AuthState::from_keys(&keys(&["secret"]), false).expect("auth");
        let res = guarded_router(auth)
            .oneshot(write_with(Some("Bearer nope")))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn write_with_valid_token_passes() {
        let auth = AuthState::from_keys(&keys(&["secret"]), false).expect("auth");
        let res = guarded_router(auth)
            .oneshot(write_with(Some("Bearer secret")))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn disabled_auth_lets_writes_through() {
        let res = guarded_router(AuthState::disabled())
            .oneshot(write_with(None))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let limit = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limit.admit().await);
        assert!(!limit.admit().await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limit.admit().await);
    }
}
