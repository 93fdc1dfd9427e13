//! Protected catalog endpoints
//!
//! Thin handlers over the external catalog; the interesting part is how they
//! compose with the response cache and the per-key usage peek.

use axum::extract::{Extension, Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequestApiKey;
use crate::api::state::AppState;
use crate::api::types::{format_reset_human, ApiError, Json};
use crate::domain::cache::CacheKeyParams;
use crate::domain::catalog::MovieSummary;

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    pub limit: Option<i64>,
}

/// `GET /api/movies/genre/{genre}` - cached catalog read
pub async fn movies_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(query): Query<GenreQuery>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let limit = normalize_limit(query.limit);

    // Only the logical inputs participate in the key; state, extensions and
    // the key holder's credential do not.
    let params = CacheKeyParams::new("catalog::movies_by_genre")
        .with_arg("genre", genre.as_str())
        .with_arg("limit", limit);

    let catalog = state.catalog.clone();
    let fetch_genre = genre.clone();
    let movies = state
        .response_cache
        .get_or_compute(&params, None, || async move {
            catalog.movies_by_genre(&fetch_genre, limit as u32).await
        })
        .await?;

    if movies.is_empty() {
        return Err(ApiError::not_found(format!(
            "No movies found for genre '{}'",
            genre
        )));
    }

    Ok(Json(movies))
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 25 => 25,
        Some(limit) if limit > 0 => limit,
        _ => 5,
    }
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub api_usage: ApiUsage,
}

#[derive(Debug, Serialize)]
pub struct ApiUsage {
    pub requests_used: u64,
    pub limit: i64,
    pub requests_remaining: i64,
    pub usage_percent: f64,
    pub reset_date: String,
    pub reset_timestamp: i64,
}

/// `GET /api/usage` - the caller's current window, read without counting
pub async fn api_usage(
    State(state): State<AppState>,
    Extension(RequestApiKey(api_key)): Extension<RequestApiKey>,
) -> Result<Json<UsageResponse>, ApiError> {
    let usage = state.limiter.usage(&api_key).await?;

    let usage_percent = if usage.limit > 0 {
        (usage.count as f64 / usage.limit as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    Ok(Json(UsageResponse {
        api_usage: ApiUsage {
            requests_used: usage.count,
            limit: usage.limit,
            requests_remaining: (usage.limit - usage.count as i64).max(0),
            usage_percent,
            reset_date: format_reset_human(usage.reset_epoch),
            reset_timestamp: usage.reset_epoch,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_limit_clamps() {
        assert_eq!(normalize_limit(None), 5);
        assert_eq!(normalize_limit(Some(0)), 5);
        assert_eq!(normalize_limit(Some(-3)), 5);
        assert_eq!(normalize_limit(Some(10)), 10);
        assert_eq!(normalize_limit(Some(26)), 25);
    }
}
