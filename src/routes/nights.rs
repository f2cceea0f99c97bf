use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{Night, NightStatus},
    routes::AppState,
    services::{
        night_room::{CalendarNight, Completion, NightDetails},
        SelectionOutcome,
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateNightRequest {
    pub title: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddCandidateRequest {
    pub movie_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: NightStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CompleteRequest {
    /// An empty body completes without a rating. Anything else must be a valid request.
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid completion body: {}", e)))
    }
}

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Night>>> {
    Ok(Json(state.night_room.list_nights().await?))
}

pub async fn upcoming(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Night>>> {
    Ok(Json(state.night_room.upcoming_nights().await?))
}

pub async fn calendar(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<CalendarNight>>> {
    Ok(Json(state.night_room.calendar().await?))
}

/// Creates a night hosted by the caller
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<CreateNightRequest>,
) -> AppResult<(StatusCode, Json<Night>)> {
    let night = state
        .night_room
        .create_night(user.id(), request.title, request.date)
        .await?;
    Ok((StatusCode::CREATED, Json(night)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NightDetails>> {
    Ok(Json(state.night_room.night_details(id).await?))
}

pub async fn add_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCandidateRequest>,
) -> AppResult<Json<Night>> {
    Ok(Json(
        state.night_room.add_candidate(id, request.movie_id).await?,
    ))
}

pub async fn join(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Night>> {
    Ok(Json(state.night_room.join(id, user.id()).await?))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<Night>> {
    Ok(Json(
        state.night_room.update_status(id, request.status).await?,
    ))
}

/// Spins the wheel. The outcome is held until committed or cancelled.
pub async fn spin(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SelectionOutcome>> {
    tracing::info!(request_id = %request_id, night_id = %id, user_id = %user.id(), "Spin requested");
    Ok(Json(state.night_room.spin(id).await?))
}

pub async fn commit_spin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Night>> {
    Ok(Json(state.night_room.commit_spin(id).await?))
}

pub async fn cancel_spin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Value> {
    let cancelled = state.night_room.cancel_spin(id);
    Json(json!({ "cancelled": cancelled }))
}

/// Finishes the night; the optional score becomes the caller's rating of the pick
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<Completion>> {
    let request = CompleteRequest::from_body(&body)?;
    let completion = state
        .night_room
        .complete(id, user.id(), request.score, request.note)
        .await?;

    tracing::info!(request_id = %request_id, night_id = %id, "Night completion handled");
    Ok(Json(completion))
}
