//! Movie metadata providers
//!
//! Lookups are a black box keyed by search text or TMDB id. `CachedLookup` layers the
//! Redis cache over any provider so the HTTP client stays cache-agnostic.

use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{TmdbMovieDetails, TmdbSearchResult},
};

pub mod tmdb;

pub use tmdb::TmdbLookup;

/// Source of descriptive movie data
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieLookup: Send + Sync {
    /// Searches movies by title text
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbSearchResult>>;

    /// Fetches full details for one TMDB id
    async fn details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Read-through Redis cache in front of another lookup
pub struct CachedLookup {
    inner: Arc<dyn MovieLookup>,
    cache: Cache,
    search_ttl: u64,
    details_ttl: u64,
}

impl CachedLookup {
    pub fn new(inner: Arc<dyn MovieLookup>, cache: Cache, search_ttl: u64, details_ttl: u64) -> Self {
        Self {
            inner,
            cache,
            search_ttl,
            details_ttl,
        }
    }
}

#[async_trait::async_trait]
impl MovieLookup for CachedLookup {
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbSearchResult>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch(query.to_string()),
            self.search_ttl,
            self.inner.search(query)
        )
    }

    async fn details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(tmdb_id),
            self.details_ttl,
            self.inner.details(tmdb_id)
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
