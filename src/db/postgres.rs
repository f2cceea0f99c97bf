use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, Night, NightStatus, Rating, User, WatchedEntry, WatchlistEntry},
};

/// Creates a PostgreSQL connection pool and brings the schema up to date
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct NightRow {
    id: Uuid,
    title: String,
    date: DateTime<Utc>,
    host_id: Uuid,
    status: String,
    attendees: Vec<Uuid>,
    candidates: Vec<Uuid>,
    picked_movie: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NightRow> for Night {
    type Error = AppError;

    fn try_from(row: NightRow) -> Result<Self, Self::Error> {
        let status: NightStatus = row.status.parse().map_err(AppError::Internal)?;
        Ok(Night {
            id: row.id,
            title: row.title,
            date: row.date,
            host_id: row.host_id,
            status,
            attendees: row.attendees,
            candidates: row.candidates,
            picked_movie: row.picked_movie,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WatchedRow {
    id: Uuid,
    movie_id: Uuid,
    night_id: Option<Uuid>,
    picked_by: Option<Uuid>,
    watched_at: DateTime<Utc>,
    ratings: Json<BTreeMap<Uuid, Rating>>,
}

impl From<WatchedRow> for WatchedEntry {
    fn from(row: WatchedRow) -> Self {
        WatchedEntry {
            id: row.id,
            movie_id: row.movie_id,
            night_id: row.night_id,
            picked_by: row.picked_by,
            watched_at: row.watched_at,
            ratings: row.ratings.0,
        }
    }
}

const MOVIE_COLUMNS: &str = "id, tmdb_id, title, poster, backdrop, overview, genres, runtime, \
     release_year, vote_average, vote_count";
const WATCHLIST_COLUMNS: &str = "id, movie_id, added_by, added_at, upvotes, note";
const NIGHT_COLUMNS: &str =
    "id, title, date, host_id, status, attendees, candidates, picked_movie, created_at";
const WATCHED_COLUMNS: &str = "id, movie_id, night_id, picked_by, watched_at, ratings";

/// Repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Repository for PgRepository {
    async fn upsert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email, avatar = EXCLUDED.avatar
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_movie_if_absent(&self, movie: Movie) -> AppResult<Movie> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, tmdb_id, title, poster, backdrop, overview, genres, runtime,
                                release_year, vote_average, vote_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (tmdb_id) DO NOTHING
            "#,
        )
        .bind(movie.id)
        .bind(movie.tmdb_id)
        .bind(&movie.title)
        .bind(&movie.poster)
        .bind(&movie.backdrop)
        .bind(&movie.overview)
        .bind(&movie.genres)
        .bind(movie.runtime)
        .bind(movie.release_year)
        .bind(movie.vote_average)
        .bind(movie.vote_count)
        .execute(&self.pool)
        .await?;

        self.get_movie_by_tmdb_id(movie.tmdb_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Movie {} vanished after insert", movie.tmdb_id)))
    }

    async fn get_movie(&self, id: Uuid) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {} FROM movies WHERE tmdb_id = $1",
            MOVIE_COLUMNS
        ))
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn list_watchlist(&self) -> AppResult<Vec<WatchlistEntry>> {
        let entries = sqlx::query_as::<_, WatchlistEntry>(&format!(
            "SELECT {} FROM watchlist_entries ORDER BY added_at",
            WATCHLIST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn get_watchlist_entry(&self, id: Uuid) -> AppResult<Option<WatchlistEntry>> {
        let entry = sqlx::query_as::<_, WatchlistEntry>(&format!(
            "SELECT {} FROM watchlist_entries WHERE id = $1",
            WATCHLIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn insert_watchlist_if_absent(&self, entry: WatchlistEntry) -> AppResult<WatchlistEntry> {
        sqlx::query(
            r#"
            INSERT INTO watchlist_entries (id, movie_id, added_by, added_at, upvotes, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (movie_id) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(entry.movie_id)
        .bind(entry.added_by)
        .bind(entry.added_at)
        .bind(&entry.upvotes)
        .bind(&entry.note)
        .execute(&self.pool)
        .await?;

        let stored = sqlx::query_as::<_, WatchlistEntry>(&format!(
            "SELECT {} FROM watchlist_entries WHERE movie_id = $1",
            WATCHLIST_COLUMNS
        ))
        .bind(entry.movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> AppResult<()> {
        let result = sqlx::query("UPDATE watchlist_entries SET upvotes = $2, note = $3 WHERE id = $1")
            .bind(entry.id)
            .bind(&entry.upvotes)
            .bind(&entry.note)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Watchlist entry {} not found", entry.id)));
        }
        Ok(())
    }

    async fn delete_watchlist_entry(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_nights(&self) -> AppResult<Vec<Night>> {
        let rows = sqlx::query_as::<_, NightRow>(&format!(
            "SELECT {} FROM movie_nights ORDER BY date DESC",
            NIGHT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Night::try_from).collect()
    }

    async fn get_night(&self, id: Uuid) -> AppResult<Option<Night>> {
        let row = sqlx::query_as::<_, NightRow>(&format!(
            "SELECT {} FROM movie_nights WHERE id = $1",
            NIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Night::try_from).transpose()
    }

    async fn insert_night(&self, night: &Night) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO movie_nights (id, title, date, host_id, status, attendees, candidates,
                                      picked_movie, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(night.id)
        .bind(&night.title)
        .bind(night.date)
        .bind(night.host_id)
        .bind(night.status.as_str())
        .bind(&night.attendees)
        .bind(&night.candidates)
        .bind(night.picked_movie)
        .bind(night.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_night(&self, night: &Night) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE movie_nights
            SET title = $2, date = $3, status = $4, attendees = $5, candidates = $6,
                picked_movie = $7
            WHERE id = $1
            "#,
        )
        .bind(night.id)
        .bind(&night.title)
        .bind(night.date)
        .bind(night.status.as_str())
        .bind(&night.attendees)
        .bind(&night.candidates)
        .bind(night.picked_movie)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Night {} not found", night.id)));
        }
        Ok(())
    }

    async fn list_watched(&self) -> AppResult<Vec<WatchedEntry>> {
        let rows = sqlx::query_as::<_, WatchedRow>(&format!(
            "SELECT {} FROM watched_entries ORDER BY watched_at DESC",
            WATCHED_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(WatchedEntry::from).collect())
    }

    async fn get_watched(&self, id: Uuid) -> AppResult<Option<WatchedEntry>> {
        let row = sqlx::query_as::<_, WatchedRow>(&format!(
            "SELECT {} FROM watched_entries WHERE id = $1",
            WATCHED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(WatchedEntry::from))
    }

    async fn find_watched_by_night(&self, night_id: Uuid) -> AppResult<Option<WatchedEntry>> {
        let row = sqlx::query_as::<_, WatchedRow>(&format!(
            "SELECT {} FROM watched_entries WHERE night_id = $1 LIMIT 1",
            WATCHED_COLUMNS
        ))
        .bind(night_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(WatchedEntry::from))
    }

    async fn insert_watched(&self, entry: &WatchedEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO watched_entries (id, movie_id, night_id, picked_by, watched_at, ratings)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.movie_id)
        .bind(entry.night_id)
        .bind(entry.picked_by)
        .bind(entry.watched_at)
        .bind(Json(&entry.ratings))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_watched(&self, entry: &WatchedEntry) -> AppResult<()> {
        let result = sqlx::query("UPDATE watched_entries SET ratings = $2 WHERE id = $1")
            .bind(entry.id)
            .bind(Json(&entry.ratings))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Watched entry {} not found", entry.id)));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
