//! Catalog read interface
//!
//! The relational catalog (schema, queries) is an external collaborator; the
//! gatekeeping subsystem only invokes it through this narrow trait.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A catalog entry as returned to API consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub rating: f32,
}

/// Idempotent catalog reads invoked by the protected handlers
#[async_trait]
pub trait Catalog: Send + Sync + Debug {
    /// Movies matching a genre, case-insensitive substring match
    async fn movies_by_genre(
        &self,
        genre: &str,
        limit: u32,
    ) -> Result<Vec<MovieSummary>, DomainError>;
}
