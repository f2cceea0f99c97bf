use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{User, UserStats},
    routes::AppState,
    services::users::{self, ProfileUpdate},
};

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(state.repo.as_ref()).await?))
}

/// The caller's profile
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<User>> {
    Ok(Json(users::get_user(state.repo.as_ref(), user.id()).await?))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    let profile = users::upsert_profile(state.repo.as_ref(), user.id(), update).await?;
    tracing::info!(user_id = %profile.id, "Profile updated");
    Ok(Json(profile))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(users::get_user(state.repo.as_ref(), id).await?))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserStats>> {
    Ok(Json(users::user_stats(state.repo.as_ref(), id).await?))
}
