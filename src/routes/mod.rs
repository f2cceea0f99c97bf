use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db::{MemoryRepository, Repository},
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware, require_user},
    services::{providers::MovieLookup, NightRoom, Selector},
};

pub mod movies;
pub mod nights;
pub mod users;
pub mod watched;
pub mod watchlist;

/// Shared application state
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    /// Absent when no TMDB token is configured
    pub lookup: Option<Arc<dyn MovieLookup>>,
    pub night_room: NightRoom,
}

impl AppState {
    pub fn new(
        config: &Config,
        repo: Arc<dyn Repository>,
        lookup: Option<Arc<dyn MovieLookup>>,
    ) -> Self {
        let night_room = NightRoom::new(
            repo.clone(),
            Selector::new(config.base_rotations),
            config.spin_reveal_timeout(),
            config.allow_repick,
        );
        Self {
            repo,
            lookup,
            night_room,
        }
    }

    /// State backed by the in-memory store
    pub fn in_memory(config: &Config, lookup: Option<Arc<dyn MovieLookup>>) -> Self {
        Self::new(config, Arc::new(MemoryRepository::new()), lookup)
    }

    pub fn lookup(&self) -> AppResult<&dyn MovieLookup> {
        self.lookup
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("Movie lookup is not configured".to_string()))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum_middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1; every one of them needs a caller identity
fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/:id", get(users::get))
        .route("/users/:id/stats", get(users::stats))
        .route("/movies", post(movies::upsert))
        .route("/movies/search", get(movies::search))
        .route("/movies/tmdb/:tmdb_id", post(movies::import))
        .route("/movies/:id", get(movies::get))
        .route("/watchlist", get(watchlist::list).post(watchlist::add))
        .route("/watchlist/count", get(watchlist::count))
        .route("/watchlist/:id", delete(watchlist::remove))
        .route("/watchlist/:id/upvote", post(watchlist::upvote))
        .route("/nights", get(nights::list).post(nights::create))
        .route("/nights/upcoming", get(nights::upcoming))
        .route("/nights/calendar", get(nights::calendar))
        .route("/nights/:id", get(nights::get))
        .route("/nights/:id/candidates", post(nights::add_candidate))
        .route("/nights/:id/join", post(nights::join))
        .route("/nights/:id/status", put(nights::update_status))
        .route("/nights/:id/spin", post(nights::spin))
        .route("/nights/:id/spin/commit", post(nights::commit_spin))
        .route("/nights/:id/spin/cancel", post(nights::cancel_spin))
        .route("/nights/:id/complete", post(nights::complete))
        .route("/watched", get(watched::list).post(watched::add))
        .route("/watched/recent", get(watched::recent))
        .route("/watched/count", get(watched::count))
        .route("/watched/:id/rating", put(watched::rate))
        .route_layer(axum_middleware::from_fn(require_user))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
