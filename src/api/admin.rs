//! Provisioning endpoints
//!
//! Administrative writes to the rate-limit configuration. Failures here use
//! the `{ error_code, detail }` body shape.

use std::time::Duration;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{Json, ProvisioningError};

#[derive(Debug, Deserialize)]
pub struct SetRateLimitRequest {
    pub identifier: String,
    pub limit: i64,
    pub period_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SetRateLimitResponse {
    pub identifier: String,
    pub limit: i64,
    pub period_secs: u64,
}

/// `POST /api/admin/rate-limits` - overwrite an identifier's limit config
pub async fn set_rate_limit(
    State(state): State<AppState>,
    Json(request): Json<SetRateLimitRequest>,
) -> Result<Json<SetRateLimitResponse>, ProvisioningError> {
    if request.identifier.trim().is_empty() {
        return Err(ProvisioningError::invalid(
            "invalid_identifier",
            "identifier must not be empty",
        ));
    }

    if request.limit < 0 {
        return Err(ProvisioningError::invalid(
            "invalid_limit",
            "limit must not be negative",
        ));
    }

    let period_secs = request.period_secs.unwrap_or(86_400);
    if period_secs == 0 {
        return Err(ProvisioningError::invalid(
            "invalid_period",
            "period must be positive",
        ));
    }

    state
        .limiter
        .set_limit(
            &request.identifier,
            request.limit,
            Duration::from_secs(period_secs),
        )
        .await?;

    Ok(Json(SetRateLimitResponse {
        identifier: request.identifier,
        limit: request.limit,
        period_secs,
    }))
}
