use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Movie, Night, User, WatchedEntry, WatchlistEntry},
};

/// Storage for the group's documents.
///
/// Aggregates are read and written whole; concurrent saves of the same document resolve
/// as last write wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    async fn upsert_user(&self, user: &User) -> AppResult<()>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Stores `movie` unless one with the same TMDB id exists, returning whichever is stored
    async fn insert_movie_if_absent(&self, movie: Movie) -> AppResult<Movie>;
    async fn get_movie(&self, id: Uuid) -> AppResult<Option<Movie>>;
    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>>;

    async fn list_watchlist(&self) -> AppResult<Vec<WatchlistEntry>>;
    async fn get_watchlist_entry(&self, id: Uuid) -> AppResult<Option<WatchlistEntry>>;
    /// Stores `entry` unless its movie is already listed, returning whichever is stored
    async fn insert_watchlist_if_absent(&self, entry: WatchlistEntry) -> AppResult<WatchlistEntry>;
    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> AppResult<()>;
    async fn delete_watchlist_entry(&self, id: Uuid) -> AppResult<bool>;

    /// All nights, latest date first
    async fn list_nights(&self) -> AppResult<Vec<Night>>;
    async fn get_night(&self, id: Uuid) -> AppResult<Option<Night>>;
    async fn insert_night(&self, night: &Night) -> AppResult<()>;
    async fn save_night(&self, night: &Night) -> AppResult<()>;

    /// All watched entries, most recently watched first
    async fn list_watched(&self) -> AppResult<Vec<WatchedEntry>>;
    async fn get_watched(&self, id: Uuid) -> AppResult<Option<WatchedEntry>>;
    async fn find_watched_by_night(&self, night_id: Uuid) -> AppResult<Option<WatchedEntry>>;
    async fn insert_watched(&self, entry: &WatchedEntry) -> AppResult<()>;
    async fn save_watched(&self, entry: &WatchedEntry) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
