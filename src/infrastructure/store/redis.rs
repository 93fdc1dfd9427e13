//! Redis store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::domain::store::{KeyValueStore, WindowSample};
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Redis-backed key-value store
///
/// Window advancement runs as a single MULTI/EXEC batch so one admission
/// check is internally consistent; see `KeyValueStore::window_advance`.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Opens a new Redis connection
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::store(format!("failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::store(format!("failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Opens a Redis store with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::connect(RedisStoreConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        match &self.config.key_prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|k| k.strip_prefix(':'))
                .unwrap_or(key),
            None => key,
        }
    }
}

fn ttl_from_secs(ttl_secs: i64) -> Option<Duration> {
    // Redis returns -2 if the key doesn't exist, -1 if it has no TTL
    if ttl_secs < 0 {
        None
    } else {
        Some(Duration::from_secs(ttl_secs as u64))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(&prefixed_key)
            .await
            .map_err(|e| DomainError::store(format!("failed to get key '{}': {}", key, e)))?;

        Ok(result)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result = match ttl {
            Some(ttl) => {
                let ttl_secs = ttl.as_secs().max(1);
                conn.set_ex(&prefixed_key, value, ttl_secs).await
            }
            None => conn.set(&prefixed_key, value).await,
        };

        result.map_err(|e| DomainError::store(format!("failed to set key '{}': {}", key, e)))
    }

    async fn get_many_raw(&self, keys: &[&str]) -> Result<Vec<Option<String>>, DomainError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let prefixed: Vec<String> = keys.iter().map(|k| self.prefix_key(k)).collect();
        let mut conn = self.connection.clone();

        let mut cmd = redis::cmd("MGET");
        for key in &prefixed {
            cmd.arg(key);
        }

        let values: Vec<Option<String>> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("failed to read keys: {}", e)))?;

        Ok(values)
    }

    async fn set_many_raw(
        &self,
        entries: &[(&str, &str)],
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for (key, value) in entries {
            let prefixed_key = self.prefix_key(key);
            match ttl {
                Some(ttl) => {
                    pipe.cmd("SETEX")
                        .arg(&prefixed_key)
                        .arg(ttl.as_secs().max(1))
                        .arg(value)
                        .ignore();
                }
                None => {
                    pipe.cmd("SET").arg(&prefixed_key).arg(value).ignore();
                }
            }
        }

        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("failed to write keys: {}", e)))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| DomainError::store(format!("failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let new_value: i64 = conn
            .incr(&prefixed_key, delta)
            .await
            .map_err(|e| DomainError::store(format!("failed to increment key '{}': {}", key, e)))?;

        Ok(new_value)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let prefixed_pattern = self.prefix_key(pattern);
        let mut conn = self.connection.clone();

        // Cursored SCAN rather than KEYS, which blocks the server
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&prefixed_pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::store(format!(
                        "failed to scan keys with pattern '{}': {}",
                        pattern, e
                    ))
                })?;

            found.extend(keys.iter().map(|k| self.strip_prefix(k).to_string()));
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs: i64 = conn
            .ttl(&prefixed_key)
            .await
            .map_err(|e| DomainError::store(format!("failed to get TTL for key '{}': {}", key, e)))?;

        Ok(ttl_from_secs(ttl_secs))
    }

    async fn window_advance(
        &self,
        key: &str,
        now_epoch: i64,
        period: Duration,
    ) -> Result<WindowSample, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let cutoff = now_epoch - period.as_secs() as i64;
        // Unique member per request so checks landing in the same second
        // each count; the score carries the timestamp.
        let member = format!("{}-{}", now_epoch, Uuid::new_v4());

        let (count, ttl_secs): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&prefixed_key)
            .arg(0)
            .arg(cutoff)
            .ignore()
            .cmd("ZADD")
            .arg(&prefixed_key)
            .arg(now_epoch)
            .arg(&member)
            .ignore()
            .cmd("ZCARD")
            .arg(&prefixed_key)
            .cmd("EXPIRE")
            .arg(&prefixed_key)
            .arg(period.as_secs().max(1))
            .ignore()
            .cmd("TTL")
            .arg(&prefixed_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::store(format!("failed to advance window '{}': {}", key, e))
            })?;

        Ok(WindowSample {
            count,
            ttl: ttl_from_secs(ttl_secs),
        })
    }

    async fn window_peek(&self, key: &str) -> Result<WindowSample, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let (count, ttl_secs): (u64, i64) = redis::pipe()
            .cmd("ZCARD")
            .arg(&prefixed_key)
            .cmd("TTL")
            .arg(&prefixed_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("failed to peek window '{}': {}", key, e)))?;

        Ok(WindowSample {
            count,
            ttl: ttl_from_secs(ttl_secs),
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("ping failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::StoreExt;

    // These tests require a running Redis instance and are ignored by default.

    fn test_config() -> RedisStoreConfig {
        RedisStoreConfig::new("redis://127.0.0.1:6379").with_key_prefix("test")
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisStoreConfig::new("redis://localhost").with_key_prefix("myapp");
        assert_eq!(config.key_prefix, Some("myapp".to_string()));
    }

    #[test]
    fn test_ttl_from_secs() {
        assert_eq!(ttl_from_secs(-2), None);
        assert_eq!(ttl_from_secs(-1), None);
        assert_eq!(ttl_from_secs(0), Some(Duration::from_secs(0)));
        assert_eq!(ttl_from_secs(60), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let store = RedisStore::connect(test_config()).await.unwrap();

        store
            .set("key1", &"value1", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        let result: Option<String> = store.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        store.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_redis_window_advance() {
        let store = RedisStore::connect(test_config()).await.unwrap();
        let now = chrono::Utc::now().timestamp();

        let first = store
            .window_advance("win1", now, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(first.count, 1);

        let second = store
            .window_advance("win1", now, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(second.count, 2);

        store.delete("win1").await.unwrap();
    }
}
