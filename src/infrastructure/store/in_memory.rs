//! In-memory store implementation
//!
//! Mirrors the Redis backend's TTL and window semantics on a mutex-guarded
//! map. Time comes from an injected [`Clock`], which makes expiry and window
//! behavior fully deterministic in tests; it also serves as the development
//! backend when no Redis is available.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::store::{KeyValueStore, WindowSample};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
enum Entry {
    Value {
        data: String,
        expires_at: Option<i64>,
    },
    Window {
        // (member, score) pairs, insertion order
        members: Vec<(String, i64)>,
        expires_at: Option<i64>,
    },
}

impl Entry {
    fn expires_at(&self) -> Option<i64> {
        match self {
            Entry::Value { expires_at, .. } | Entry::Window { expires_at, .. } => *expires_at,
        }
    }

    fn is_expired(&self, now_epoch: i64) -> bool {
        self.expires_at().is_some_and(|at| at <= now_epoch)
    }
}

/// In-memory key-value store with clock-driven expiry
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Drops `key` if its TTL has elapsed, then runs `f` over the map
    fn with_entries<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Entry>, i64) -> T,
    ) -> T {
        let now = self.clock.now_epoch();
        let mut entries = self.entries.lock().unwrap();

        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }

        f(&mut entries, now)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.with_entries(key, |entries, _| match entries.get(key) {
            Some(Entry::Value { data, .. }) => Some(data.clone()),
            _ => None,
        }))
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.with_entries(key, |entries, now| {
            entries.insert(
                key.to_string(),
                Entry::Value {
                    data: value.to_string(),
                    expires_at: ttl.map(|t| now + t.as_secs().max(1) as i64),
                },
            );
        });
        Ok(())
    }

    async fn get_many_raw(&self, keys: &[&str]) -> Result<Vec<Option<String>>, DomainError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get_raw(key).await?);
        }
        Ok(values)
    }

    async fn set_many_raw(
        &self,
        entries: &[(&str, &str)],
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        for (key, value) in entries {
            self.set_raw(key, value, ttl).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.with_entries(key, |entries, _| entries.remove(key).is_some()))
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64, DomainError> {
        Ok(self.with_entries(key, |entries, _| match entries.get_mut(key) {
            Some(Entry::Value { data, .. }) => {
                let new_value = data.parse::<i64>().unwrap_or(0) + delta;
                *data = new_value.to_string();
                new_value
            }
            _ => {
                // A missing key starts from zero with no TTL, as INCR does
                entries.insert(
                    key.to_string(),
                    Entry::Value {
                        data: delta.to_string(),
                        expires_at: None,
                    },
                );
                delta
            }
        }))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let prefix = pattern.trim_end_matches('*');
        let now = self.clock.now_epoch();
        let entries = self.entries.lock().unwrap();

        Ok(entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.with_entries(key, |entries, now| {
            entries
                .get(key)
                .and_then(|e| e.expires_at())
                .map(|at| Duration::from_secs((at - now).max(0) as u64))
        }))
    }

    async fn window_advance(
        &self,
        key: &str,
        now_epoch: i64,
        period: Duration,
    ) -> Result<WindowSample, DomainError> {
        let period_secs = period.as_secs().max(1) as i64;
        let cutoff = now_epoch - period_secs;
        let member = format!("{}-{}", now_epoch, Uuid::new_v4());

        Ok(self.with_entries(key, |entries, _| {
            match entries.get_mut(key) {
                Some(Entry::Window {
                    members,
                    expires_at,
                }) => {
                    members.retain(|(_, score)| *score > cutoff);
                    members.push((member, now_epoch));
                    *expires_at = Some(now_epoch + period_secs);
                    WindowSample {
                        count: members.len() as u64,
                        ttl: Some(period),
                    }
                }
                _ => {
                    entries.insert(
                        key.to_string(),
                        Entry::Window {
                            members: vec![(member, now_epoch)],
                            expires_at: Some(now_epoch + period_secs),
                        },
                    );
                    WindowSample {
                        count: 1,
                        ttl: Some(period),
                    }
                }
            }
        }))
    }

    async fn window_peek(&self, key: &str) -> Result<WindowSample, DomainError> {
        Ok(self.with_entries(key, |entries, now| match entries.get(key) {
            Some(Entry::Window {
                members,
                expires_at,
            }) => WindowSample {
                // No pruning: logically expired members still count until
                // the next advance removes them.
                count: members.len() as u64,
                ttl: expires_at.map(|at| Duration::from_secs((at - now).max(0) as u64)),
            },
            _ => WindowSample {
                count: 0,
                ttl: None,
            },
        }))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
