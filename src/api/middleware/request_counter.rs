//! Global request counter middleware
//!
//! Outermost application middleware: every request, public or protected,
//! bumps the process-wide counters and carries the running total back in
//! `X-Request-Count`.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::api::state::AppState;
use crate::api::types::MessageResponse;

pub async fn request_counter(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let total = match state.usage.increment().await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, "request counter update failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(
                    "Internal server error in request counter",
                )),
            )
                .into_response();
        }
    };

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        response.headers_mut().insert("x-request-count", value);
    }

    response
}
