use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, NewMovie, TmdbSearchResult},
    services::providers::MovieLookup,
};

/// Searches the metadata provider by title
pub async fn search_movies(
    lookup: &dyn MovieLookup,
    query: &str,
) -> AppResult<Vec<TmdbSearchResult>> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    lookup.search(query).await
}

/// Stores a movie unless its TMDB id is already known; either way returns the stored one
pub async fn upsert_movie(repo: &dyn Repository, movie: NewMovie) -> AppResult<Movie> {
    if movie.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Movie title cannot be empty".to_string()));
    }
    let stored = repo.insert_movie_if_absent(movie.into_movie()).await?;
    tracing::debug!(movie_id = %stored.id, tmdb_id = stored.tmdb_id, "Movie upserted");
    Ok(stored)
}

/// Imports a movie by TMDB id, fetching details only for movies not stored yet
pub async fn import_movie(
    repo: &dyn Repository,
    lookup: &dyn MovieLookup,
    tmdb_id: i64,
) -> AppResult<Movie> {
    if let Some(existing) = repo.get_movie_by_tmdb_id(tmdb_id).await? {
        return Ok(existing);
    }

    let details = lookup.details(tmdb_id).await?;
    tracing::info!(tmdb_id, provider = lookup.name(), "Importing movie");
    upsert_movie(repo, details.into()).await
}

pub async fn get_movie(repo: &dyn Repository, id: Uuid) -> AppResult<Movie> {
    repo.get_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
}
