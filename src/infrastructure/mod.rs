//! Infrastructure layer - store backends and gatekeeping services

pub mod catalog;
pub mod identity;
pub mod logging;
pub mod rate_limit;
pub mod response_cache;
pub mod store;
pub mod usage;

pub use catalog::InMemoryCatalog;
pub use identity::{InMemoryIdentityStore, PostgresIdentityStore};
pub use rate_limit::RateLimiter;
pub use response_cache::ResponseCache;
pub use store::{InMemoryStore, RedisStore, RedisStoreConfig, StoreFactory};
pub use usage::{UsageCounters, UsageSnapshot};
