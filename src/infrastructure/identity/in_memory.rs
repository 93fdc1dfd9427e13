//! In-memory identity store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::identity::{Identity, IdentityStore};
use crate::domain::DomainError;

/// Identity store backed by a map; development and test backend
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: Mutex<HashMap<String, Identity>>,
    error: Mutex<Option<String>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(self, identity: Identity) -> Self {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.api_key.clone(), identity);
        self
    }

    /// Makes every lookup fail, simulating an unreachable identity backend
    pub fn with_error(self, error: impl Into<String>) -> Self {
        *self.error.lock().unwrap() = Some(error.into());
        self
    }

    pub fn insert(&self, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.api_key.clone(), identity);
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_key(&self, api_key: &str) -> Result<Option<Identity>, DomainError> {
        if let Some(error) = self.error.lock().unwrap().clone() {
            return Err(DomainError::store(error));
        }

        Ok(self.identities.lock().unwrap().get(api_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_distinguishes_absent_from_error() {
        let store = InMemoryIdentityStore::new().with_identity(Identity::new("known", 100));

        let found = store.find_by_key("known").await.unwrap();
        assert_eq!(found, Some(Identity::new("known", 100)));

        let missing = store.find_by_key("unknown").await.unwrap();
        assert!(missing.is_none());

        let failing = InMemoryIdentityStore::new().with_error("down");
        assert!(failing.find_by_key("known").await.is_err());
    }
}
