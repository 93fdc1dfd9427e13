//! Authentication and rate-limit gate
//!
//! Classifies each request against the access policy; protected requests go
//! through credential extraction, identity resolution and the sliding-window
//! check before the inner handler runs. Each stage reports its outcome as a
//! `GateError` kind rather than an exception-style unwind, so the pipeline
//! composes as ordinary `Result` flow.

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::api::policy::RouteClass;
use crate::api::state::AppState;
use crate::api::types::{rate_limit_headers, GateError};
use crate::domain::identity::Identity;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The credential a protected request presented, stored in request extensions
#[derive(Debug, Clone)]
pub struct RequestApiKey(pub String);

/// The admission decision attached to a protected request
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub limit: i64,
    pub remaining: i64,
    pub reset_epoch: i64,
}

pub async fn auth_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.policy.classify(request.uri().path()) {
        RouteClass::Bypass | RouteClass::Unguarded => next.run(request).await,
        RouteClass::Protected => match enforce(&state, request, next).await {
            Ok(response) => response,
            Err(gate_error) => gate_error.into_response(),
        },
    }
}

async fn enforce(
    state: &AppState,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    let api_key = extract_api_key(request.headers()).ok_or(GateError::MissingCredential)?;

    let identity = resolve_identity(state, &api_key).await?;

    let decision = state
        .limiter
        .check_and_update(&api_key, Some(identity.request_limit))
        .await
        .map_err(|e| {
            error!(error = %e, "rate limiter unavailable, failing closed");
            GateError::Unavailable
        })?;

    if !decision.admitted {
        warn!(
            key_prefix = %key_prefix(&api_key),
            limit = decision.limit,
            "request denied, limit exceeded"
        );
        return Err(GateError::LimitExceeded {
            limit: decision.limit,
            reset_epoch: decision.reset_epoch,
        });
    }

    let status = RateLimitStatus {
        limit: decision.limit,
        remaining: decision.remaining,
        reset_epoch: decision.reset_epoch,
    };

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(RequestApiKey(api_key));
    request.extensions_mut().insert(status);

    let mut response = next.run(request).await;
    rate_limit_headers(
        response.headers_mut(),
        status.limit,
        status.remaining,
        status.reset_epoch,
    );

    Ok(response)
}

async fn resolve_identity(state: &AppState, api_key: &str) -> Result<Identity, GateError> {
    debug!(key_prefix = %key_prefix(api_key), "resolving identity");

    // A lookup failure is not the same thing as an unknown key: without the
    // identity store no admission decision can be made.
    state
        .identities
        .find_by_key(api_key)
        .await
        .map_err(|e| {
            error!(error = %e, "identity store unavailable");
            GateError::Unavailable
        })?
        .ok_or(GateError::InvalidCredential)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn key_prefix(api_key: &str) -> String {
    api_key.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("sk-test-123"));

        assert_eq!(extract_api_key(&headers), Some("sk-test-123".to_string()));
    }

    #[test]
    fn test_extract_api_key_trims_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("  sk-test  "));

        assert_eq!(extract_api_key(&headers), Some("sk-test".to_string()));
    }

    #[test]
    fn test_missing_or_empty_header_is_none() {
        assert_eq!(extract_api_key(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_api_key(&headers), None);
    }
}
