use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, User, WatchlistEntry},
};

/// Watchlist entry with its movie and the member who added it
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistItem {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    pub movie: Movie,
    pub added_by_user: Option<User>,
    pub upvote_count: usize,
}

/// The group's watchlist, most upvoted first. Entries whose movie is gone are skipped.
pub async fn list_watchlist(repo: &dyn Repository) -> AppResult<Vec<WatchlistItem>> {
    let entries = repo.list_watchlist().await?;
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(movie) = repo.get_movie(entry.movie_id).await? else {
            tracing::warn!(entry_id = %entry.id, movie_id = %entry.movie_id, "Watchlist entry without movie");
            continue;
        };
        let added_by_user = repo.get_user(entry.added_by).await?;
        items.push(WatchlistItem {
            upvote_count: entry.upvote_count(),
            entry,
            movie,
            added_by_user,
        });
    }

    // stable: equal vote counts keep insertion order
    items.sort_by(|a, b| b.upvote_count.cmp(&a.upvote_count));
    Ok(items)
}

/// Adds a movie to the watchlist. A movie already listed returns its existing entry.
pub async fn add_to_watchlist(
    repo: &dyn Repository,
    user_id: Uuid,
    movie_id: Uuid,
    note: Option<String>,
) -> AppResult<WatchlistEntry> {
    if repo.get_movie(movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
    }
    let note = note.filter(|n| !n.trim().is_empty());
    repo.insert_watchlist_if_absent(WatchlistEntry::new(movie_id, user_id, note))
        .await
}

/// Flips the caller's upvote on an entry
pub async fn toggle_upvote(
    repo: &dyn Repository,
    user_id: Uuid,
    entry_id: Uuid,
) -> AppResult<WatchlistEntry> {
    let mut entry = repo
        .get_watchlist_entry(entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Watchlist entry {} not found", entry_id)))?;

    let upvoted = entry.toggle_upvote(user_id);
    repo.save_watchlist_entry(&entry).await?;

    tracing::debug!(entry_id = %entry_id, user_id = %user_id, upvoted, "Upvote toggled");
    Ok(entry)
}

pub async fn remove_from_watchlist(repo: &dyn Repository, entry_id: Uuid) -> AppResult<()> {
    if !repo.delete_watchlist_entry(entry_id).await? {
        return Err(AppError::NotFound(format!(
            "Watchlist entry {} not found",
            entry_id
        )));
    }
    Ok(())
}

pub async fn watchlist_count(repo: &dyn Repository) -> AppResult<usize> {
    Ok(repo.list_watchlist().await?.len())
}
