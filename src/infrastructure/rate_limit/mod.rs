//! Sliding-window rate limiter
//!
//! Counts requests in the trailing `period` seconds using a per-identifier
//! window set in the key-value store. Admission is count-then-decide: the
//! check records its own entry before evaluating the limit, so a denied
//! request still occupies the window until it is pruned by a later check.
//! The window is bounded by `period`, so this does not grow without bound.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::rate_limit::{
    config_limit_key, config_period_key, window_key, RateLimitConfig, RateLimitDecision,
    RateLimitUsage,
};
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Retention for persisted per-identifier limit overrides
const CONFIG_RETENTION: Duration = Duration::from_secs(365 * 86_400);

/// Sliding-window request limiter over the key-value store
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    defaults: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            defaults: RateLimitConfig::default(),
        }
    }

    /// Overrides the defaults used when an identifier has no persisted config
    pub fn with_defaults(mut self, defaults: RateLimitConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// The `(limit, period)` applied to identifiers without persisted config
    pub fn defaults(&self) -> RateLimitConfig {
        self.defaults
    }

    /// Admits or denies a request for `identifier`, recording it in the window.
    ///
    /// The effective limit is `limit_override` when supplied, else the
    /// identifier's persisted config, else the defaults. The whole window
    /// mutation is one atomic store batch; the config read never touches the
    /// window.
    pub async fn check_and_update(
        &self,
        identifier: &str,
        limit_override: Option<i64>,
    ) -> Result<RateLimitDecision, DomainError> {
        let config = self.limit_config(identifier).await?;
        let limit = limit_override.unwrap_or(config.limit);
        let period = config.period;
        let now = self.clock.now_epoch();

        if limit <= 0 {
            return Ok(RateLimitDecision {
                admitted: false,
                remaining: 0,
                limit: 0,
                reset_epoch: next_period_boundary(now, period),
            });
        }

        let sample = self
            .store
            .window_advance(&window_key(identifier), now, period)
            .await?;

        let remaining = limit - sample.count as i64;
        let admitted = remaining >= 0;
        let reset_epoch = reset_from_ttl(now, period, sample.ttl);

        debug!(
            identifier,
            count = sample.count,
            limit,
            remaining = remaining.max(0),
            admitted,
            reset_epoch,
            "rate limit check"
        );

        Ok(RateLimitDecision {
            admitted,
            remaining: remaining.max(0),
            limit,
            reset_epoch,
        })
    }

    /// Reports current usage without recording a request.
    ///
    /// The window is not pruned here, so right after a window naturally
    /// expires this can report a stale nonzero count until the next
    /// `check_and_update` for the identifier prunes it.
    pub async fn usage(&self, identifier: &str) -> Result<RateLimitUsage, DomainError> {
        let config = self.limit_config(identifier).await?;
        let now = self.clock.now_epoch();

        let sample = self.store.window_peek(&window_key(identifier)).await?;

        Ok(RateLimitUsage {
            count: sample.count,
            limit: config.limit,
            reset_epoch: reset_from_ttl(now, config.period, sample.ttl),
        })
    }

    /// Unconditionally overwrites the identifier's persisted limit config.
    /// Does not touch an in-flight window.
    pub async fn set_limit(
        &self,
        identifier: &str,
        limit: i64,
        period: Duration,
    ) -> Result<(), DomainError> {
        let limit_value = limit.to_string();
        let period_value = period.as_secs().to_string();

        self.store
            .set_many_raw(
                &[
                    (&config_limit_key(identifier), limit_value.as_str()),
                    (&config_period_key(identifier), period_value.as_str()),
                ],
                Some(CONFIG_RETENTION),
            )
            .await?;

        info!(
            identifier,
            limit,
            period_secs = period.as_secs(),
            "rate limit configured"
        );

        Ok(())
    }

    /// Resolves the identifier's persisted `(limit, period)`, falling back to
    /// the defaults. Read-only with respect to the window.
    pub async fn limit_config(&self, identifier: &str) -> Result<RateLimitConfig, DomainError> {
        let values = self
            .store
            .get_many_raw(&[
                &config_limit_key(identifier),
                &config_period_key(identifier),
            ])
            .await?;

        let limit = values
            .first()
            .and_then(|v| v.as_deref())
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.defaults.limit);
        let period = values
            .get(1)
            .and_then(|v| v.as_deref())
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.defaults.period);

        Ok(RateLimitConfig::new(limit, period))
    }
}

fn next_period_boundary(now: i64, period: Duration) -> i64 {
    let period = period.as_secs().max(1) as i64;
    (now / period + 1) * period
}

fn reset_from_ttl(now: i64, period: Duration, ttl: Option<Duration>) -> i64 {
    match ttl {
        Some(ttl) if ttl.as_secs() > 0 => now + ttl.as_secs() as i64,
        // Brand-new window whose TTL has not been observed yet
        _ => next_period_boundary(now, period),
    }
}
