use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use reviewlens_core::AppConfig;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Tracked clients above which expired windows are pruned.
const PRUNE_THRESHOLD: usize = 4096;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter with one window per client.
///
/// Clients are keyed by peer IP when the server runs with connect info,
/// otherwise by the first `x-forwarded-for` hop.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Limiter sized by the `rate_limit_*` settings in `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    /// Counts one request for `client`; `false` once its budget is spent.
    async fn try_acquire(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, w| now.duration_since(w.started_at) < self.window);
        }

        let window = clients
            .entry(client.to_owned())
            .or_insert(RateLimitWindow {
                started_at: now,
                count: 0,
            });
        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_owned()
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

/// Middleware enforcing a fixed request-per-window limit per client.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if !rate_limit.try_acquire(&client).await {
        tracing::warn!(uri = %req.uri(), client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, middleware::from_fn, routing::get, Extension, Router};
    use tower::ServiceExt;

    use super::*;

    async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
        id.0
    }

    fn request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn request_id_is_generated_when_absent() {
        let app = Router::new()
            .route("/", get(echo_request_id))
            .layer(from_fn(request_id));

        let response = app.oneshot(request("/")).await.expect("response");
        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("x-request-id header");
        assert!(Uuid::parse_str(header).is_ok());
    }

    #[tokio::test]
    async fn request_id_is_propagated_when_present() {
        let app = Router::new()
            .route("/", get(echo_request_id))
            .layer(from_fn(request_id));

        let req = axum::http::Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "req-abc")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(req).await.expect("response");
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "req-abc"
        );
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_max_requests() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                enforce_rate_limit,
            ));

        for _ in 0..2 {
            let response = app.clone().oneshot(request("/")).await.expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.oneshot(request("/")).await.expect("response");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    fn test_config(max_requests: usize, window_secs: u64) -> AppConfig {
        AppConfig {
            env: reviewlens_core::Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
            log_level: "info".to_owned(),
            user_agent: "reviewlens-test".to_owned(),
            review_source_url: "http://reviews.local".to_owned(),
            review_timeout_secs: 5,
            review_max_attempts: 1,
            llm_url: "http://llm.local".to_owned(),
            llm_api_key: None,
            llm_model: "test-model".to_owned(),
            llm_timeout_secs: 5,
            llm_max_attempts: 1,
            retry_initial_delay_ms: 0,
            retry_backoff_multiplier: 2,
            sample_size: 10,
            sample_fallback: true,
            normalize_sentiment: false,
            rate_limit_max_requests: max_requests,
            rate_limit_window_secs: window_secs,
        }
    }

    fn request_from(ip: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri("/")
            .header(FORWARDED_FOR_HEADER, format!("{ip}, 10.0.0.1"))
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn rate_limit_budgets_are_per_client() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                enforce_rate_limit,
            ));

        let first = app.clone().oneshot(request_from("203.0.113.7")).await;
        assert_eq!(first.expect("response").status(), StatusCode::OK);
        let repeat = app.clone().oneshot(request_from("203.0.113.7")).await;
        assert_eq!(repeat.expect("response").status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.oneshot(request_from("198.51.100.2")).await;
        assert_eq!(other.expect("response").status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn peer_address_takes_precedence_over_forwarded_header() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let peer: SocketAddr = "192.0.2.10:5000".parse().expect("socket addr");

        let mut first = request_from("203.0.113.7");
        first.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_key(&first), "192.0.2.10");
        assert!(limiter.try_acquire(&client_key(&first)).await);

        let mut spoofed = request_from("198.51.100.2");
        spoofed.extensions_mut().insert(ConnectInfo(peer));
        assert!(!limiter.try_acquire(&client_key(&spoofed)).await);
    }

    #[test]
    fn requests_without_client_hints_share_one_key() {
        assert_eq!(client_key(&request("/")), "unknown");
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let limiter = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.try_acquire("a").await);
    }

    #[test]
    fn limiter_is_sized_from_config() {
        let config = test_config(7, 15);
        let limiter = RateLimitState::from_config(&config);
        assert_eq!(limiter.max_requests, 7);
        assert_eq!(limiter.window, Duration::from_secs(15));
    }
}
