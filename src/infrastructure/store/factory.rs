//! Store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryStore;
use super::redis::{RedisStore, RedisStoreConfig};

/// Factory for creating store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates a store instance based on configuration
    pub async fn create(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        match config.backend {
            StoreBackend::InMemory => {
                info!("Using in-memory key-value store");
                Ok(Arc::new(InMemoryStore::new()))
            }
            StoreBackend::Redis => {
                info!("Connecting to Redis at {}", config.redis_url);
                let store =
                    RedisStore::connect(RedisStoreConfig::new(config.redis_url.clone())).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::StoreExt;

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let config = StoreConfig {
            backend: StoreBackend::InMemory,
            ..Default::default()
        };

        let store = StoreFactory::create(&config).await.unwrap();

        store
            .set("test", &"value", Some(std::time::Duration::from_secs(60)))
            .await
            .unwrap();

        let result: Option<String> = store.get("test").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }
}
