//! Router assembly
//!
//! Middleware order, outermost first: tracing, CORS, request counter, auth
//! gate, then the handlers. The counter wraps the gate so denied requests
//! still count and still carry `X-Request-Count`.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{admin, catalog, health, status};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/status/api", get(status::api_status))
        .route("/api/movies/genre/{genre}", get(catalog::movies_by_genre))
        .route("/api/usage", get(catalog::api_usage))
        .route("/api/admin/rate-limits", post(admin::set_rate_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            super::middleware::auth_gate,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            super::middleware::request_counter,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::policy::AccessPolicy;
    use crate::domain::clock::SystemClock;
    use crate::domain::identity::Identity;
    use crate::infrastructure::catalog::InMemoryCatalog;
    use crate::infrastructure::identity::InMemoryIdentityStore;
    use crate::infrastructure::rate_limit::RateLimiter;
    use crate::infrastructure::response_cache::ResponseCache;
    use crate::infrastructure::store::InMemoryStore;
    use crate::infrastructure::usage::UsageCounters;

    const GOOD_KEY: &str = "good-key";

    async fn test_state(identities: InMemoryIdentityStore) -> AppState {
        let clock = Arc::new(SystemClock);
        let store = Arc::new(InMemoryStore::new());
        let limiter = Arc::new(RateLimiter::new(store.clone(), clock.clone()));
        let response_cache = Arc::new(ResponseCache::new(store.clone(), Duration::from_secs(300)));
        let usage = Arc::new(UsageCounters::new(store.clone(), clock.clone()));
        usage.initialize().await.unwrap();

        AppState::new(
            store,
            Arc::new(identities),
            Arc::new(InMemoryCatalog::sample()),
            limiter,
            response_cache,
            usage,
            Arc::new(AccessPolicy::catalog_default()),
        )
    }

    async fn test_router() -> Router {
        // The provisioned key admits two requests per day
        let identities = InMemoryIdentityStore::new().with_identity(Identity::new(GOOD_KEY, 2));
        create_router(test_state(identities).await)
    }

    fn get_request(path: &str, api_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let router = test_router().await;

        let response = router
            .oneshot(get_request("/api/movies/genre/drama", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "API key is missing");
    }

    #[tokio::test]
    async fn test_unknown_key_is_forbidden() {
        let router = test_router().await;

        let response = router
            .oneshot(get_request("/api/movies/genre/drama", Some("nope")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_valid_key_passes_with_rate_limit_headers() {
        let router = test_router().await;

        let response = router
            .oneshot(get_request("/api/movies/genre/drama", Some(GOOD_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "2");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "1");
        assert!(headers.contains_key("x-ratelimit-reset"));
        assert!(headers.contains_key("x-ratelimit-reset-human"));
    }

    #[tokio::test]
    async fn test_exhausted_limit_is_429_with_headers_and_human_reset() {
        let router = test_router().await;

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(get_request("/api/movies/genre/drama", Some(GOOD_KEY)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = router
            .oneshot(get_request("/api/movies/genre/drama", Some(GOOD_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
        assert!(response.headers().contains_key("x-ratelimit-reset-human"));

        let body = body_json(response).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("Request limit exceeded"));
        assert!(message.contains("UTC"));
    }

    #[tokio::test]
    async fn test_allowlisted_paths_skip_the_gate() {
        let router = test_router().await;

        // No key, still served
        let response = router
            .clone()
            .oneshot(get_request("/status/api", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));

        // Exact allowlist entry under /api: unrouted here, but the gate must
        // not answer 401 for it
        let response = router
            .oneshot(get_request("/api/register", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_allowlisted_path_never_touches_the_window() {
        let identities = InMemoryIdentityStore::new().with_identity(Identity::new(GOOD_KEY, 2));
        let state = test_state(identities).await;
        let router = create_router(state.clone());

        // Header present but the path is allowlisted: no window entry
        router
            .oneshot(get_request("/status/api", Some(GOOD_KEY)))
            .await
            .unwrap();

        let usage = state.limiter.usage(GOOD_KEY).await.unwrap();
        assert_eq!(usage.count, 0);
    }

    #[tokio::test]
    async fn test_unguarded_path_passes_through() {
        let router = test_router().await;

        let response = router
            .oneshot(get_request("/favicon.ico", None))
            .await
            .unwrap();

        // Not this subsystem's business: no gate error, plain router 404
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }

    #[tokio::test]
    async fn test_identity_store_failure_is_500_not_403() {
        let identities = InMemoryIdentityStore::new().with_error("connection refused");
        let router = create_router(test_state(identities).await);

        let response = router
            .oneshot(get_request("/api/movies/genre/drama", Some(GOOD_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_request_count_header_increments() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(get_request("/status/api", None))
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-count").unwrap(), "1");

        let response = router
            .oneshot(get_request("/status/api", None))
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-count").unwrap(), "2");
    }

    #[tokio::test]
    async fn test_usage_endpoint_reports_current_window() {
        let identities = InMemoryIdentityStore::new().with_identity(Identity::new(GOOD_KEY, 2));
        let state = test_state(identities).await;
        // Provisioning seeds the persisted config with the identity's limit
        state
            .limiter
            .set_limit(GOOD_KEY, 2, Duration::from_secs(86_400))
            .await
            .unwrap();
        let router = create_router(state);

        router
            .clone()
            .oneshot(get_request("/api/movies/genre/drama", Some(GOOD_KEY)))
            .await
            .unwrap();

        let response = router
            .oneshot(get_request("/api/usage", Some(GOOD_KEY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        // The usage endpoint's own admission check counts too
        assert_eq!(body["api_usage"]["requests_used"], 2);
        assert_eq!(body["api_usage"]["limit"], 2);
        assert_eq!(body["api_usage"]["requests_remaining"], 0);
    }

    #[tokio::test]
    async fn test_unknown_genre_is_404_message() {
        let router = test_router().await;

        let response = router
            .oneshot(get_request("/api/movies/genre/western", Some(GOOD_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("western"));
    }

    #[tokio::test]
    async fn test_admin_provisioning_validation_error_shape() {
        let router = test_router().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/admin/rate-limits")
            .header("x-api-key", GOOD_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"identifier":"someone","limit":-1}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error_code"], "invalid_limit");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_admin_provisioning_applies_to_later_requests() {
        let identities = InMemoryIdentityStore::new()
            .with_identity(Identity::new(GOOD_KEY, 100))
            .with_identity(Identity::new("other-key", 100));
        let state = test_state(identities).await;
        let router = create_router(state.clone());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/admin/rate-limits")
            .header("x-api-key", GOOD_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"identifier":"other-key","limit":7,"period_secs":3600}"#,
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let config = state.limiter.limit_config("other-key").await.unwrap();
        assert_eq!(config.limit, 7);
        assert_eq!(config.period, Duration::from_secs(3600));
    }
}
