use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::WatchedEntry,
    routes::AppState,
    services::watched::{self, NewWatched, WatchedItem, DEFAULT_RECENT_LIMIT},
};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub score: i64,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<WatchedItem>>> {
    Ok(Json(watched::list_watched(state.repo.as_ref()).await?))
}

pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentQuery>,
) -> AppResult<Json<Vec<WatchedItem>>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(watched::recent_watched(state.repo.as_ref(), limit).await?))
}

pub async fn count(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let count = watched::watched_count(state.repo.as_ref()).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewWatched>,
) -> AppResult<(StatusCode, Json<WatchedEntry>)> {
    let entry = watched::add_watched(state.repo.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Sets the caller's score, replacing any earlier one
pub async fn rate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<WatchedEntry>> {
    let entry =
        watched::rate_watched(state.repo.as_ref(), user.id(), id, request.score, request.note)
            .await?;
    Ok(Json(entry))
}
