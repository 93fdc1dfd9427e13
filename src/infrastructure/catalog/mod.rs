//! Catalog implementations
//!
//! The real catalog lives in the relational database owned by the query
//! service; the in-memory variant backs development and the pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::catalog::{Catalog, MovieSummary};
use crate::domain::DomainError;

/// Catalog backed by a fixed in-memory collection
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    movies: Mutex<Vec<(String, MovieSummary)>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(self, genre: impl Into<String>, movie: MovieSummary) -> Self {
        self.movies
            .lock()
            .unwrap()
            .push((genre.into().to_lowercase(), movie));
        self
    }

    /// A handful of titles for development mode
    pub fn sample() -> Self {
        Self::new()
            .with_movie(
                "drama",
                MovieSummary {
                    id: 1,
                    title: "Heat".to_string(),
                    year: 1995,
                    rating: 8.3,
                },
            )
            .with_movie(
                "drama",
                MovieSummary {
                    id: 2,
                    title: "Ronin".to_string(),
                    year: 1998,
                    rating: 7.2,
                },
            )
            .with_movie(
                "comedy",
                MovieSummary {
                    id: 3,
                    title: "The Big Lebowski".to_string(),
                    year: 1998,
                    rating: 8.1,
                },
            )
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn movies_by_genre(
        &self,
        genre: &str,
        limit: u32,
    ) -> Result<Vec<MovieSummary>, DomainError> {
        let needle = genre.to_lowercase();
        let movies = self.movies.lock().unwrap();

        Ok(movies
            .iter()
            .filter(|(g, _)| g.contains(&needle))
            .map(|(_, m)| m.clone())
            .take(limit as usize)
            .collect())
    }
}
