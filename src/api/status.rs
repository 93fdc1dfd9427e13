//! Public status endpoint

use std::time::Duration;

use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub request_count: RequestCount,
    pub uptime: String,
    pub version: String,
    pub limits: Limits,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RequestCount {
    pub total: u64,
    pub today: u64,
    pub active_users: usize,
}

#[derive(Debug, Serialize)]
pub struct Limits {
    pub default_limit: i64,
}

/// `GET /status/api` - counters snapshot; allowlisted, no key required
pub async fn api_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.usage.snapshot().await?;
    let default_limit = state.limiter.defaults().limit;

    Ok(Json(StatusResponse {
        status: "online".to_string(),
        request_count: RequestCount {
            total: snapshot.total_requests,
            today: snapshot.requests_today,
            active_users: snapshot.active_identifiers,
        },
        uptime: format_uptime(snapshot.uptime),
        version: env!("CARGO_PKG_VERSION").to_string(),
        limits: Limits { default_limit },
        message: format!(
            "API is running normally. Default limit per API key: {} requests per day.",
            default_limit
        ),
    }))
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, minutes, seconds) = (rest / 3_600, rest % 3_600 / 60, rest % 60);

    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}
