//! PostgreSQL identity lookup

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::identity::{Identity, IdentityStore};
use crate::domain::DomainError;

/// Identity lookup against the catalog's `users` table
#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn find_by_key(&self, api_key: &str) -> Result<Option<Identity>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT api_key, daily_request_limit
            FROM users
            WHERE api_key = $1
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("failed to look up identity: {}", e)))?;

        match row {
            Some(row) => {
                let api_key: String = row
                    .try_get("api_key")
                    .map_err(|e| DomainError::store(format!("bad identity row: {}", e)))?;
                let request_limit: i64 = row
                    .try_get("daily_request_limit")
                    .map_err(|e| DomainError::store(format!("bad identity row: {}", e)))?;

                Ok(Some(Identity::new(api_key, request_limit)))
            }
            None => Ok(None),
        }
    }
}
