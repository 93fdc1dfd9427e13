//! Cache key derivation
//!
//! A cache key binds a handler's identity (its scope) to the argument values
//! that define the logical result. Handlers declare exactly which arguments
//! participate; infrastructure parameters (connections, request contexts,
//! task queues) are never declared and therefore never leak into the key.
//! Arguments serialize to canonical JSON with stable field ordering, so the
//! same call always derives the same key and distinct argument values always
//! derive distinct keys.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::domain::DomainError;

/// Declared inputs of a cacheable handler call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheKeyParams {
    /// Handler identity, e.g. `catalog::movies_by_genre`
    scope: String,
    /// Declared arguments, sorted by name
    args: BTreeMap<String, Value>,
}

impl CacheKeyParams {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            args: BTreeMap::new(),
        }
    }

    /// Declares an argument that participates in the key
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Declares an argument from any serializable value; fails instead of
    /// falling back to an empty argument set, which would collide distinct
    /// calls onto one entry.
    pub fn try_with_arg<T: Serialize>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, DomainError> {
        let value = serde_json::to_value(value).map_err(|e| {
            DomainError::serialization(format!("cache key argument not serializable: {}", e))
        })?;
        self.args.insert(name.into(), value);
        Ok(self)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Derives the store key: `cache:<scope>:<canonical-args>`
    pub fn key(&self) -> String {
        // BTreeMap ordering makes the JSON rendering canonical
        let args = serde_json::to_string(&self.args).unwrap_or_else(|_| "{}".to_string());
        format!("cache:{}:{}", self.scope, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_includes_scope_and_args() {
        let params = CacheKeyParams::new("catalog::movies_by_genre")
            .with_arg("genre", "drama")
            .with_arg("limit", 5);

        assert_eq!(
            params.key(),
            r#"cache:catalog::movies_by_genre:{"genre":"drama","limit":5}"#
        );
    }

    #[test]
    fn test_args_are_canonically_ordered() {
        let a = CacheKeyParams::new("h").with_arg("zebra", 1).with_arg("apple", 2);
        let b = CacheKeyParams::new("h").with_arg("apple", 2).with_arg("zebra", 1);

        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_distinct_argument_values_derive_distinct_keys() {
        let a = CacheKeyParams::new("h").with_arg("genre", "drama");
        let b = CacheKeyParams::new("h").with_arg("genre", "comedy");

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_distinct_scopes_derive_distinct_keys() {
        let a = CacheKeyParams::new("catalog::by_genre").with_arg("q", "x");
        let b = CacheKeyParams::new("catalog::by_year").with_arg("q", "x");

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_empty_args() {
        let params = CacheKeyParams::new("status::snapshot");
        assert_eq!(params.key(), "cache:status::snapshot:{}");
    }

    #[test]
    fn test_try_with_arg() {
        #[derive(Serialize)]
        struct Filter {
            year: u16,
        }

        let params = CacheKeyParams::new("h")
            .try_with_arg("filter", &Filter { year: 1999 })
            .unwrap();

        assert!(params.key().contains(r#""year":1999"#));
    }
}
