//! TTL response cache
//!
//! Memoizes idempotent handler results in the key-value store for a bounded
//! time. The cache is best-effort and never load-bearing: any store or
//! serialization problem is logged and the freshly computed result is
//! returned to the caller unchanged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::domain::cache::CacheKeyParams;
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Wrapping combinator for cacheable handlers
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached result for `params`, or computes, stores and
    /// returns a fresh one.
    ///
    /// A hit that fails to deserialize is treated as corrupted: the entry is
    /// deleted and the call proceeds as a miss. Store failures on either the
    /// read or the write never fail the request; only the computation's own
    /// error propagates.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        params: &CacheKeyParams,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let key = params.key();

        match self.store.get_raw(&key).await {
            Ok(Some(data)) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key, error = %e, "corrupted cache entry, discarding");
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(key, error = %e, "failed to delete corrupted cache entry");
                    }
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
            }
            Err(e) => {
                // Read failure: compute uncached, skip the write as well
                warn!(key, error = %e, "cache read failed, bypassing cache");
                return compute().await;
            }
        }

        let result = compute().await?;

        let data = match serde_json::to_string(&result) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "result not serializable, skipping cache");
                return Ok(result);
            }
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Err(e) = self.store.set_raw(&key, &data, Some(ttl)).await {
            warn!(key, error = %e, "cache write failed");
        } else {
            debug!(key, ttl_secs = ttl.as_secs(), "cached result");
        }

        Ok(result)
    }
}
