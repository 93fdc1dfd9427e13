//! Rate limiting entities
//!
//! The limiter itself lives in the infrastructure layer; these are the
//! configuration and decision types it trades in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-identifier limit configuration: `limit` requests per trailing `period`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub limit: i64,
    pub period: Duration,
}

impl RateLimitConfig {
    pub const DEFAULT_LIMIT: i64 = 1000;
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(86_400);

    pub fn new(limit: i64, period: Duration) -> Self {
        Self { limit, period }
    }

    pub fn period_secs(&self) -> u64 {
        self.period.as_secs()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            period: Self::DEFAULT_PERIOD,
        }
    }
}

/// Outcome of a mutating admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub admitted: bool,
    /// Requests left in the window, never negative
    pub remaining: i64,
    /// The limit the decision was made against
    pub limit: i64,
    /// Epoch seconds at which the window resets
    pub reset_epoch: i64,
}

/// Read-only view of an identifier's current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitUsage {
    pub count: u64,
    pub limit: i64,
    pub reset_epoch: i64,
}

/// Window set for an identifier
pub fn window_key(identifier: &str) -> String {
    format!("rate_limit:{}", identifier)
}

/// Persisted limit override for an identifier
pub fn config_limit_key(identifier: &str) -> String {
    format!("rate_limit_config:{}:limit", identifier)
}

/// Persisted period override for an identifier
pub fn config_period_key(identifier: &str) -> String {
    format!("rate_limit_config:{}:period", identifier)
}
