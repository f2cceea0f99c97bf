use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, Night, User, WatchedEntry, WatchlistEntry},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    movies: HashMap<Uuid, Movie>,
    watchlist: HashMap<Uuid, WatchlistEntry>,
    nights: HashMap<Uuid, Night>,
    watched: HashMap<Uuid, WatchedEntry>,
}

/// Process-local repository, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(kind: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    async fn upsert_user(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert_movie_if_absent(&self, movie: Movie) -> AppResult<Movie> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.movies.values().find(|m| m.tmdb_id == movie.tmdb_id) {
            return Ok(existing.clone());
        }
        tables.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get_movie(&self, id: Uuid) -> AppResult<Option<Movie>> {
        Ok(self.tables.read().await.movies.get(&id).cloned())
    }

    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.values().find(|m| m.tmdb_id == tmdb_id).cloned())
    }

    async fn list_watchlist(&self) -> AppResult<Vec<WatchlistEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<WatchlistEntry> = tables.watchlist.values().cloned().collect();
        entries.sort_by_key(|e| e.added_at);
        Ok(entries)
    }

    async fn get_watchlist_entry(&self, id: Uuid) -> AppResult<Option<WatchlistEntry>> {
        Ok(self.tables.read().await.watchlist.get(&id).cloned())
    }

    async fn insert_watchlist_if_absent(&self, entry: WatchlistEntry) -> AppResult<WatchlistEntry> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .watchlist
            .values()
            .find(|e| e.movie_id == entry.movie_id)
        {
            return Ok(existing.clone());
        }
        tables.watchlist.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.watchlist.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(missing("Watchlist entry", entry.id)),
        }
    }

    async fn delete_watchlist_entry(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.watchlist.remove(&id).is_some())
    }

    async fn list_nights(&self) -> AppResult<Vec<Night>> {
        let tables = self.tables.read().await;
        let mut nights: Vec<Night> = tables.nights.values().cloned().collect();
        nights.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(nights)
    }

    async fn get_night(&self, id: Uuid) -> AppResult<Option<Night>> {
        Ok(self.tables.read().await.nights.get(&id).cloned())
    }

    async fn insert_night(&self, night: &Night) -> AppResult<()> {
        self.tables
            .write()
            .await
            .nights
            .insert(night.id, night.clone());
        Ok(())
    }

    async fn save_night(&self, night: &Night) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.nights.get_mut(&night.id) {
            Some(stored) => {
                *stored = night.clone();
                Ok(())
            }
            None => Err(missing("Night", night.id)),
        }
    }

    async fn list_watched(&self) -> AppResult<Vec<WatchedEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<WatchedEntry> = tables.watched.values().cloned().collect();
        entries.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(entries)
    }

    async fn get_watched(&self, id: Uuid) -> AppResult<Option<WatchedEntry>> {
        Ok(self.tables.read().await.watched.get(&id).cloned())
    }

    async fn find_watched_by_night(&self, night_id: Uuid) -> AppResult<Option<WatchedEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .watched
            .values()
            .find(|e| e.night_id == Some(night_id))
            .cloned())
    }

    async fn insert_watched(&self, entry: &WatchedEntry) -> AppResult<()> {
        self.tables
            .write()
            .await
            .watched
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn save_watched(&self, entry: &WatchedEntry) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.watched.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(missing("Watched entry", entry.id)),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
