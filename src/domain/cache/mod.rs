//! Response cache domain types - key derivation

mod key;

pub use key::CacheKeyParams;
