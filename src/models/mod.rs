use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod night;
pub mod user;
pub mod watched;
pub mod watchlist;

pub use night::{Night, NightStatus};
pub use user::{User, UserStats};
pub use watched::{Rating, RatingError, Score, WatchedEntry};
pub use watchlist::WatchlistEntry;

const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w342";
const TMDB_BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w1280";
pub const PLACEHOLDER_POSTER: &str = "/placeholder.jpg";

/// A movie known to the group, keyed by its TMDB id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub tmdb_id: i64,
    pub title: String,
    pub poster: String,
    pub backdrop: Option<String>,
    pub overview: String,
    pub genres: Vec<String>,
    pub runtime: Option<i32>,
    pub release_year: i32,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
}

/// Fields needed to store a movie; the id is assigned on insert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMovie {
    pub tmdb_id: i64,
    pub title: String,
    #[serde(default = "placeholder_poster")]
    pub poster: String,
    #[serde(default)]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub release_year: i32,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}

fn placeholder_poster() -> String {
    PLACEHOLDER_POSTER.to_string()
}

impl NewMovie {
    pub fn into_movie(self) -> Movie {
        Movie {
            id: Uuid::new_v4(),
            tmdb_id: self.tmdb_id,
            title: self.title,
            poster: self.poster,
            backdrop: self.backdrop,
            overview: self.overview,
            genres: self.genres,
            runtime: self.runtime,
            release_year: self.release_year,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
        }
    }
}

/// Compact movie view used in listings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieSummary {
    pub id: Uuid,
    pub title: String,
    pub poster: String,
    pub vote_average: Option<f64>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster: movie.poster.clone(),
            vote_average: movie.vote_average,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// One hit from TMDB's /search/movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbSearchResult {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}

/// Page wrapper returned by TMDB search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchPage {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

/// Response from TMDB's /movie/{id}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

/// Year of a TMDB `YYYY-MM-DD` date, 0 when missing or malformed
fn release_year(release_date: Option<&str>) -> i32 {
    release_date
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year())
        .unwrap_or(0)
}

impl From<TmdbMovieDetails> for NewMovie {
    fn from(details: TmdbMovieDetails) -> Self {
        let release_year = release_year(details.release_date.as_deref());
        NewMovie {
            tmdb_id: details.id,
            title: details.title,
            poster: details
                .poster_path
                .map(|p| format!("{}{}", TMDB_POSTER_BASE, p))
                .unwrap_or_else(placeholder_poster),
            backdrop: details
                .backdrop_path
                .map(|p| format!("{}{}", TMDB_BACKDROP_BASE, p)),
            overview: details.overview,
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            runtime: details.runtime,
            release_year,
            vote_average: details.vote_average,
            vote_count: details.vote_count,
        }
    }
}
