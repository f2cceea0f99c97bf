use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, Score, WatchedEntry},
};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Request to log a watched movie
#[derive(Debug, Clone, Deserialize)]
pub struct NewWatched {
    pub movie_id: Uuid,
    #[serde(default)]
    pub night_id: Option<Uuid>,
    #[serde(default)]
    pub picked_by: Option<Uuid>,
    #[serde(default)]
    pub watched_at: Option<DateTime<Utc>>,
}

/// Watched entry joined with its movie
#[derive(Debug, Clone, Serialize)]
pub struct WatchedItem {
    #[serde(flatten)]
    pub entry: WatchedEntry,
    pub movie: Option<Movie>,
    pub average_score: Option<f64>,
}

async fn with_movies(repo: &dyn Repository, entries: Vec<WatchedEntry>) -> AppResult<Vec<WatchedItem>> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let movie = repo.get_movie(entry.movie_id).await?;
        items.push(WatchedItem {
            average_score: entry.average_score(),
            entry,
            movie,
        });
    }
    Ok(items)
}

/// Everything watched, most recent first
pub async fn list_watched(repo: &dyn Repository) -> AppResult<Vec<WatchedItem>> {
    let entries = repo.list_watched().await?;
    with_movies(repo, entries).await
}

pub async fn recent_watched(repo: &dyn Repository, limit: usize) -> AppResult<Vec<WatchedItem>> {
    let mut entries = repo.list_watched().await?;
    entries.truncate(limit);
    with_movies(repo, entries).await
}

pub async fn watched_count(repo: &dyn Repository) -> AppResult<usize> {
    Ok(repo.list_watched().await?.len())
}

pub async fn add_watched(repo: &dyn Repository, request: NewWatched) -> AppResult<WatchedEntry> {
    if repo.get_movie(request.movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Movie {} not found",
            request.movie_id
        )));
    }

    let entry = WatchedEntry::new(
        request.movie_id,
        request.night_id,
        request.picked_by,
        request.watched_at.unwrap_or_else(Utc::now),
    );
    repo.insert_watched(&entry).await?;

    tracing::info!(entry_id = %entry.id, movie_id = %entry.movie_id, "Watched entry logged");
    Ok(entry)
}

/// Records the caller's score for a watched entry, replacing their earlier one
pub async fn rate_watched(
    repo: &dyn Repository,
    user_id: Uuid,
    entry_id: Uuid,
    score: i64,
    note: Option<String>,
) -> AppResult<WatchedEntry> {
    let score = Score::new(score)?;
    let mut entry = repo
        .get_watched(entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Watched entry {} not found", entry_id)))?;

    let replaced = entry.rate(user_id, score, note).is_some();
    repo.save_watched(&entry).await?;

    tracing::info!(
        entry_id = %entry_id,
        user_id = %user_id,
        score = score.value(),
        replaced,
        "Rating recorded"
    );
    Ok(entry)
}
