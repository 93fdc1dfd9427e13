//! Store infrastructure - key-value backend implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::StoreFactory;
pub use in_memory::InMemoryStore;
pub use redis::{RedisStore, RedisStoreConfig};
