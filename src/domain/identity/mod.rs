//! Caller identity - the catalog's view of an API key holder
//!
//! Identities are owned by the catalog's persistence layer; this subsystem
//! only reads them to authorize requests and seed per-identifier limits.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A resolved caller: the API key and the request limit provisioned for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub api_key: String,
    pub request_limit: i64,
}

impl Identity {
    pub fn new(api_key: impl Into<String>, request_limit: i64) -> Self {
        Self {
            api_key: api_key.into(),
            request_limit,
        }
    }
}

/// Read-only identity lookup
///
/// `Ok(None)` means the key is not provisioned; `Err` means the backing
/// store could not be reached. Callers must not conflate the two.
#[async_trait]
pub trait IdentityStore: Send + Sync + Debug {
    async fn find_by_key(&self, api_key: &str) -> Result<Option<Identity>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_new() {
        let identity = Identity::new("key-1", 500);
        assert_eq!(identity.api_key, "key-1");
        assert_eq!(identity.request_limit, 500);
    }
}
