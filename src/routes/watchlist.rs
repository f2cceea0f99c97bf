use axum::{
    extract::{Path, State},
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
    models::WatchlistEntry,
    routes::AppState,
    services::watchlist::{self, WatchlistItem},
};

#[derive(Debug, Deserialize)]
pub struct AddToWatchlistRequest {
    pub movie_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<WatchlistItem>>> {
    Ok(Json(watchlist::list_watchlist(state.repo.as_ref()).await?))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<AddToWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistEntry>)> {
    let entry =
        watchlist::add_to_watchlist(state.repo.as_ref(), user.id(), request.movie_id, request.note)
            .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn count(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let count = watchlist::watchlist_count(state.repo.as_ref()).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn upvote(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WatchlistEntry>> {
    Ok(Json(
        watchlist::toggle_upvote(state.repo.as_ref(), user.id(), id).await?,
    ))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watchlist::remove_from_watchlist(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
