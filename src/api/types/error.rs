//! API error types
//!
//! Two body shapes, per the service's external contract: gate and handler
//! failures render `{ "message": ... }`; provisioning-path failures render
//! `{ "error_code": ..., "detail": ... }`.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// `{ "message": ... }` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Terminal gate outcomes, short-circuiting the pipeline before the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No `X-API-Key` header on a protected path
    MissingCredential,
    /// The key is not provisioned
    InvalidCredential,
    /// The sliding window is full
    LimitExceeded { limit: i64, reset_epoch: i64 },
    /// The store or the identity backend could not be reached; admission
    /// cannot be decided, so the gate fails closed
    Unavailable,
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential => StatusCode::FORBIDDEN,
            Self::LimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingCredential => "API key is missing".to_string(),
            Self::InvalidCredential => "Invalid API key".to_string(),
            Self::LimitExceeded { limit, reset_epoch } => format!(
                "Request limit exceeded ({} requests). Limit resets at {}.",
                limit,
                format_reset_human(*reset_epoch)
            ),
            Self::Unavailable => {
                "Internal server error during API request processing".to_string()
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();

        // A denial still reports the limit state it was decided against
        if let Self::LimitExceeded { limit, reset_epoch } = &self {
            rate_limit_headers(&mut headers, *limit, 0, *reset_epoch);
        }

        let body = Json(MessageResponse::new(self.message()));
        (self.status(), headers, body).into_response()
    }
}

/// Handler-level error with a `{ "message": ... }` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::new(self.message))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::new(StatusCode::BAD_REQUEST, message),
            // Store and everything else stays opaque to the caller
            _ => Self::internal("Internal server error"),
        }
    }
}

/// `{ "error_code": ..., "detail": ... }` body for the provisioning path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningErrorBody {
    pub error_code: String,
    pub detail: String,
}

/// Provisioning-path error with its own body shape
#[derive(Debug)]
pub struct ProvisioningError {
    pub status: StatusCode,
    pub body: ProvisioningErrorBody,
}

impl ProvisioningError {
    pub fn new(
        status: StatusCode,
        error_code: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: ProvisioningErrorBody {
                error_code: error_code.into(),
                detail: detail.into(),
            },
        }
    }

    pub fn invalid(error_code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_code, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_unavailable",
            detail,
        )
    }
}

impl IntoResponse for ProvisioningError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DomainError> for ProvisioningError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Store { .. } => Self::unavailable("store unavailable"),
            DomainError::Validation { message } => Self::invalid("invalid_request", message),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            ),
        }
    }
}

/// Formats an epoch as the human-readable reset timestamp used in headers
/// and denial bodies.
pub fn format_reset_human(reset_epoch: i64) -> String {
    DateTime::from_timestamp(reset_epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| reset_epoch.to_string())
}

/// Attaches the rate-limit header set to a response
pub fn rate_limit_headers(headers: &mut HeaderMap, limit: i64, remaining: i64, reset_epoch: i64) {
    let entries = [
        ("x-ratelimit-limit", limit.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset_epoch.to_string()),
        ("x-ratelimit-reset-human", format_reset_human(reset_epoch)),
    ];

    for (name, value) in entries {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_error_statuses() {
        assert_eq!(GateError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GateError::InvalidCredential.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GateError::LimitExceeded {
                limit: 10,
                reset_epoch: 0
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(GateError::Unavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_limit_exceeded_body_carries_human_reset() {
        let err = GateError::LimitExceeded {
            limit: 1000,
            reset_epoch: 1_700_000_000,
        };

        let message = err.message();
        assert!(message.contains("1000 requests"));
        assert!(message.contains("UTC"));
    }

    #[test]
    fn test_limit_exceeded_response_has_headers() {
        let err = GateError::LimitExceeded {
            limit: 5,
            reset_epoch: 1_700_000_000,
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("x-ratelimit-limit").unwrap(),
            "5"
        );
        assert_eq!(
            response.headers().get("x-ratelimit-remaining").unwrap(),
            "0"
        );
        assert!(response.headers().contains_key("x-ratelimit-reset-human"));
    }

    #[test]
    fn test_format_reset_human() {
        assert_eq!(format_reset_human(0), "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_provisioning_error_body_shape() {
        let err = ProvisioningError::invalid("invalid_limit", "limit must not be negative");
        let json = serde_json::to_string(&err.body).unwrap();

        assert!(json.contains("\"error_code\":\"invalid_limit\""));
        assert!(json.contains("\"detail\""));
    }

    #[test]
    fn test_domain_error_conversions() {
        let api: ApiError = DomainError::store("down").into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);

        let api: ApiError = DomainError::not_found("no such genre").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);

        let prov: ProvisioningError = DomainError::store("down").into();
        assert_eq!(prov.body.error_code, "store_unavailable");
    }
}
