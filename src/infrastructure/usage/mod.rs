//! Process-wide usage counters
//!
//! Aggregate request counters kept in the store so they survive restarts and
//! are shared by every worker: a monotonic total, a daily counter that rolls
//! over at UTC midnight, and the set of identifiers with a live rate-limit
//! window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::debug;

use crate::domain::clock::Clock;
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

const TOTAL_KEY: &str = "api:total_requests";
const TODAY_KEY: &str = "api:requests_today";
const LAST_RESET_KEY: &str = "api:last_reset";
const START_TIME_KEY: &str = "api:start_time";

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub requests_today: u64,
    /// Identifiers with a live rate-limit window. Derived from an O(keys)
    /// scan of the window namespace; fine at this namespace scale, maintain
    /// an explicit set before pointing high-cardinality traffic at it.
    pub active_identifiers: usize,
    pub uptime: Duration,
}

/// Global request counters with daily rollover
#[derive(Debug, Clone)]
pub struct UsageCounters {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl UsageCounters {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Seeds the start-time and reset markers; called once at startup
    pub async fn initialize(&self) -> Result<(), DomainError> {
        let now = self.clock.now();

        self.store
            .set_raw(START_TIME_KEY, &now.to_rfc3339(), None)
            .await?;

        if self.store.get_raw(LAST_RESET_KEY).await?.is_none() {
            self.store
                .set_raw(LAST_RESET_KEY, &midnight(now).to_rfc3339(), None)
                .await?;
        }

        Ok(())
    }

    /// Bumps the total, rolling the daily counter over on the first request
    /// of a new UTC day. Returns the new total.
    pub async fn increment(&self) -> Result<u64, DomainError> {
        let total = self.store.increment(TOTAL_KEY, 1).await?;

        let now = self.clock.now();
        let today = midnight(now);

        let last_reset = match self.store.get_raw(LAST_RESET_KEY).await? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(today),
            None => {
                self.store
                    .set_raw(LAST_RESET_KEY, &today.to_rfc3339(), None)
                    .await?;
                today
            }
        };

        if today > last_reset {
            debug!(day = %today.date_naive(), "daily counter rollover");
            self.store.set_raw(TODAY_KEY, "0", None).await?;
            self.store
                .set_raw(LAST_RESET_KEY, &today.to_rfc3339(), None)
                .await?;
        }

        self.store.increment(TODAY_KEY, 1).await?;

        Ok(total.max(0) as u64)
    }

    pub async fn snapshot(&self) -> Result<UsageSnapshot, DomainError> {
        let total_requests = self.read_counter(TOTAL_KEY).await?;
        let requests_today = self.read_counter(TODAY_KEY).await?;
        let active_identifiers = self.store.keys("rate_limit:*").await?.len();

        let uptime = match self.store.get_raw(START_TIME_KEY).await? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|start| {
                    (self.clock.now() - start.with_timezone(&Utc))
                        .to_std()
                        .unwrap_or_default()
                })
                .unwrap_or_default(),
            None => Duration::default(),
        };

        Ok(UsageSnapshot {
            total_requests,
            requests_today,
            active_identifiers,
            uptime,
        })
    }

    async fn read_counter(&self, key: &str) -> Result<u64, DomainError> {
        Ok(self
            .store
            .get_raw(key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }
}

fn midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
