//! Key-value store trait definition
//!
//! The store is the only shared mutable state in the gatekeeping subsystem:
//! rate-limit windows, per-identifier limit overrides, cached responses and
//! the global usage counters all live behind this trait. Implementations must
//! apply `window_advance` as a single atomic batch; everything else is a
//! plain single-attempt operation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::domain::DomainError;

/// Observation of a rate-limit window: its cardinality and remaining life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSample {
    /// Number of entries currently in the window set
    pub count: u64,
    /// Remaining time-to-live of the window key, if it has one
    pub ttl: Option<Duration>,
}

/// TTL-capable key-value backend with sorted-set windows
///
/// Uses JSON strings internally to be dyn-compatible; the [`StoreExt`]
/// helpers provide typed get/set.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Gets a raw value; expired keys read as absent
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value, with an optional TTL
    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError>;

    /// Reads several keys in one pipelined batch
    async fn get_many_raw(&self, keys: &[&str]) -> Result<Vec<Option<String>>, DomainError>;

    /// Writes several keys in one transactional batch, all with the same TTL
    async fn set_many_raw(
        &self,
        entries: &[(&str, &str)],
        ttl: Option<Duration>,
    ) -> Result<(), DomainError>;

    /// Deletes a key, reporting whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Increments a numeric value, returning the new value
    async fn increment(&self, key: &str, delta: i64) -> Result<i64, DomainError>;

    /// Lists live keys matching a glob pattern (trailing `*` only)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError>;

    /// Remaining TTL for a key, `None` when absent or persistent
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Advances a sliding window in one atomic batch, applied in order:
    /// remove entries scored below `now - period`, add a fresh entry scored
    /// `now`, count the result, refresh the key expiry to `period`, read the
    /// remaining TTL.
    async fn window_advance(
        &self,
        key: &str,
        now_epoch: i64,
        period: Duration,
    ) -> Result<WindowSample, DomainError>;

    /// Samples a window without mutating it: cardinality and TTL as stored,
    /// expired entries included in the count.
    async fn window_peek(&self, key: &str) -> Result<WindowSample, DomainError>;

    /// Round-trips the backend connection
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait StoreExt: KeyValueStore {
    /// Gets a typed value from the store
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::corruption(format!("failed to deserialize value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value with an optional TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Option<Duration>,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::serialization(format!("failed to serialize value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing KeyValueStore
impl<T: KeyValueStore + ?Sized> StoreExt for T {}
