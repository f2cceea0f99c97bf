use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Movie, NewMovie, TmdbSearchResult},
    routes::AppState,
    services::movies,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Handler for the TMDB title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<TmdbSearchResult>>> {
    let lookup = state.lookup()?;
    let results = movies::search_movies(lookup, &params.q).await?;

    tracing::debug!(
        request_id = %request_id,
        query = %params.q,
        results = results.len(),
        "Movie search completed"
    );
    Ok(Json(results))
}

pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Json(movie): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = movies::upsert_movie(state.repo.as_ref(), movie).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// Stores a movie from its TMDB details
pub async fn import(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(tmdb_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let lookup = state.lookup()?;
    let movie = movies::import_movie(state.repo.as_ref(), lookup, tmdb_id).await?;

    tracing::info!(request_id = %request_id, tmdb_id, movie_id = %movie.id, "Movie imported");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Movie>> {
    Ok(Json(movies::get_movie(state.repo.as_ref(), id).await?))
}
