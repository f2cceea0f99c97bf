use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("Score must be between {min} and {max}, got {got}", min = Score::MIN, max = Score::MAX)]
    OutOfRange { got: i64 },
}

/// A validated 1-10 rating score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, RatingError> {
        if value < Self::MIN as i64 || value > Self::MAX as i64 {
            return Err(RatingError::OutOfRange { got: value });
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// One user's rating of a watched movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub score: Score,
    pub note: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// A movie the group has watched, with everyone's ratings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEntry {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub night_id: Option<Uuid>,
    pub picked_by: Option<Uuid>,
    pub watched_at: DateTime<Utc>,
    /// At most one rating per user
    pub ratings: BTreeMap<Uuid, Rating>,
}

impl WatchedEntry {
    pub fn new(
        movie_id: Uuid,
        night_id: Option<Uuid>,
        picked_by: Option<Uuid>,
        watched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            movie_id,
            night_id,
            picked_by,
            watched_at,
            ratings: BTreeMap::new(),
        }
    }

    /// Records `user_id`'s rating, replacing any earlier one
    pub fn rate(&mut self, user_id: Uuid, score: Score, note: Option<String>) -> Option<Rating> {
        let note = note.filter(|n| !n.trim().is_empty());
        self.ratings.insert(
            user_id,
            Rating {
                score,
                note,
                rated_at: Utc::now(),
            },
        )
    }

    pub fn rating_by(&self, user_id: &Uuid) -> Option<&Rating> {
        self.ratings.get(user_id)
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.values().map(|r| r.score.value() as u32).sum();
        Some(total as f64 / self.ratings.len() as f64)
    }
}
