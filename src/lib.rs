//! Catalog API
//!
//! A catalog-query web service fronted by a request-gatekeeping pipeline:
//! - API key authentication against the catalog's identity store
//! - Sliding-window rate limiting with per-identifier overrides
//! - TTL response caching for idempotent catalog reads
//! - Process-wide usage counters with daily rollover

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use api::policy::AccessPolicy;
use api::state::AppState;
use domain::catalog::Catalog;
use domain::clock::SystemClock;
use domain::identity::IdentityStore;
use domain::rate_limit::RateLimitConfig;
use infrastructure::catalog::InMemoryCatalog;
use infrastructure::identity::{InMemoryIdentityStore, PostgresIdentityStore};
use infrastructure::rate_limit::RateLimiter;
use infrastructure::response_cache::ResponseCache;
use infrastructure::store::StoreFactory;
use infrastructure::usage::UsageCounters;

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let clock = Arc::new(SystemClock);
    let store = StoreFactory::create(&config.store).await?;

    let (identities, catalog): (Arc<dyn IdentityStore>, Arc<dyn Catalog>) =
        match &config.database.url {
            Some(url) => {
                info!("Connecting to PostgreSQL identity store...");
                let pool = sqlx::PgPool::connect(url).await.map_err(|e| {
                    anyhow::anyhow!("failed to connect to PostgreSQL: {}", e)
                })?;
                info!("PostgreSQL connection established");

                (
                    Arc::new(PostgresIdentityStore::new(pool)),
                    Arc::new(InMemoryCatalog::sample()),
                )
            }
            None => {
                info!("No database configured, using in-memory identities (development mode)");
                (
                    Arc::new(InMemoryIdentityStore::new()),
                    Arc::new(InMemoryCatalog::sample()),
                )
            }
        };

    let limiter = Arc::new(RateLimiter::new(store.clone(), clock.clone()).with_defaults(
        RateLimitConfig::new(
            config.rate_limit.default_limit,
            Duration::from_secs(config.rate_limit.default_period_secs),
        ),
    ));

    let response_cache = Arc::new(ResponseCache::new(
        store.clone(),
        Duration::from_secs(config.cache.default_ttl_secs),
    ));

    let usage = Arc::new(UsageCounters::new(store.clone(), clock));
    usage.initialize().await?;

    Ok(AppState::new(
        store,
        identities,
        catalog,
        limiter,
        response_cache,
        usage,
        Arc::new(AccessPolicy::catalog_default()),
    ))
}
