//! Movie night orchestration.
//!
//! The night room is the only caller of the selector. It decides whether a night may be
//! spun at all, hands the candidates to the night's wheel, and writes committed winners
//! back onto the night.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{Movie, MovieSummary, Night, NightStatus, Score, User, WatchedEntry},
    services::{
        selector::{Candidate, SelectionOutcome, Selector},
        spin::SpinRegistry,
    },
};

/// Night with the documents it references
#[derive(Debug, Clone, Serialize)]
pub struct NightDetails {
    #[serde(flatten)]
    pub night: Night,
    /// Candidate movies in wheel order
    pub candidate_movies: Vec<Movie>,
    pub picked_movie_data: Option<Movie>,
    pub host: Option<User>,
    pub attendee_users: Vec<User>,
    pub spinning: bool,
}

/// Night as shown on the calendar
#[derive(Debug, Clone, Serialize)]
pub struct CalendarNight {
    #[serde(flatten)]
    pub night: Night,
    pub picked_movie_data: Option<MovieSummary>,
    pub avg_rating: Option<f64>,
}

/// What finishing a night produced
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub night: Night,
    pub watched: Option<WatchedEntry>,
}

pub struct NightRoom {
    repo: Arc<dyn Repository>,
    spins: SpinRegistry,
    allow_repick: bool,
}

impl NightRoom {
    pub fn new(
        repo: Arc<dyn Repository>,
        selector: Selector,
        reveal_timeout: Duration,
        allow_repick: bool,
    ) -> Self {
        Self {
            repo,
            spins: SpinRegistry::new(selector, reveal_timeout),
            allow_repick,
        }
    }

    pub fn allow_repick(&self) -> bool {
        self.allow_repick
    }

    async fn load(&self, night_id: Uuid) -> AppResult<Night> {
        self.repo
            .get_night(night_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Night {} not found", night_id)))
    }

    /// Candidate movies in wheel order, skipping ids whose movie is gone
    async fn candidate_movies(&self, night: &Night) -> AppResult<Vec<Movie>> {
        let mut movies = Vec::with_capacity(night.candidates.len());
        for id in &night.candidates {
            match self.repo.get_movie(*id).await? {
                Some(movie) => movies.push(movie),
                None => tracing::warn!(night_id = %night.id, movie_id = %id, "Candidate movie missing"),
            }
        }
        Ok(movies)
    }

    pub async fn create_night(
        &self,
        host_id: Uuid,
        title: String,
        date: DateTime<Utc>,
    ) -> AppResult<Night> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Night title cannot be empty".to_string()));
        }

        let night = Night::new(title, date, host_id);
        self.repo.insert_night(&night).await?;

        tracing::info!(night_id = %night.id, host_id = %host_id, "Movie night created");
        Ok(night)
    }

    pub async fn list_nights(&self) -> AppResult<Vec<Night>> {
        self.repo.list_nights().await
    }

    pub async fn upcoming_nights(&self) -> AppResult<Vec<Night>> {
        let nights = self.repo.list_nights().await?;
        Ok(nights
            .into_iter()
            .filter(|n| n.status == NightStatus::Upcoming)
            .collect())
    }

    pub async fn night_details(&self, night_id: Uuid) -> AppResult<NightDetails> {
        let night = self.load(night_id).await?;
        let candidate_movies = self.candidate_movies(&night).await?;
        let picked_movie_data = match night.picked_movie {
            Some(id) => self.repo.get_movie(id).await?,
            None => None,
        };
        let host = self.repo.get_user(night.host_id).await?;

        let mut attendee_users = Vec::with_capacity(night.attendees.len());
        for id in &night.attendees {
            if let Some(user) = self.repo.get_user(*id).await? {
                attendee_users.push(user);
            }
        }

        Ok(NightDetails {
            spinning: self.spins.is_spinning(night.id),
            night,
            candidate_movies,
            picked_movie_data,
            host,
            attendee_users,
        })
    }

    /// Every night, latest first, with its pick and the average score it got
    pub async fn calendar(&self) -> AppResult<Vec<CalendarNight>> {
        let nights = self.repo.list_nights().await?;
        let mut calendar = Vec::with_capacity(nights.len());

        for night in nights {
            let mut picked_movie_data = None;
            let mut avg_rating = None;

            if let Some(movie_id) = night.picked_movie {
                picked_movie_data = self
                    .repo
                    .get_movie(movie_id)
                    .await?
                    .as_ref()
                    .map(MovieSummary::from);
                avg_rating = self
                    .repo
                    .find_watched_by_night(night.id)
                    .await?
                    .and_then(|entry| entry.average_score());
            }

            calendar.push(CalendarNight {
                night,
                picked_movie_data,
                avg_rating,
            });
        }

        Ok(calendar)
    }

    /// Puts a stored movie on the night's wheel. Re-adding a candidate changes nothing.
    pub async fn add_candidate(&self, night_id: Uuid, movie_id: Uuid) -> AppResult<Night> {
        let mut night = self.load(night_id).await?;
        if night.is_done() {
            return Err(AppError::Conflict("Night is already done".to_string()));
        }
        if self.repo.get_movie(movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
        }

        if night.add_candidate(movie_id) {
            self.repo.save_night(&night).await?;
            tracing::debug!(night_id = %night_id, movie_id = %movie_id, candidates = night.candidates.len(), "Candidate added");
        }
        Ok(night)
    }

    pub async fn join(&self, night_id: Uuid, user_id: Uuid) -> AppResult<Night> {
        let mut night = self.load(night_id).await?;
        if night.join(user_id) {
            self.repo.save_night(&night).await?;
            tracing::debug!(night_id = %night_id, user_id = %user_id, "Attendee joined");
        }
        Ok(night)
    }

    /// Moves the night forward; backward moves are refused
    pub async fn update_status(&self, night_id: Uuid, status: NightStatus) -> AppResult<Night> {
        let mut night = self.load(night_id).await?;
        let previous = night.status;

        night.advance(status).map_err(|current| {
            AppError::Conflict(format!(
                "Cannot move night from {} back to {}",
                current, status
            ))
        })?;

        if previous != status {
            if night.is_done() {
                self.spins.cancel(night_id);
            }
            self.repo.save_night(&night).await?;
            tracing::info!(night_id = %night_id, from = %previous, to = %status, "Night status changed");
        }
        Ok(night)
    }

    /// Checks whether the night may be spun and returns its wheel candidates
    async fn spinnable(&self, night_id: Uuid) -> AppResult<Vec<Candidate>> {
        let night = self.load(night_id).await?;
        if night.is_done() {
            return Err(AppError::Conflict(
                "Night is already done; its pick is final".to_string(),
            ));
        }
        if night.picked_movie.is_some() && !self.allow_repick {
            return Err(AppError::Conflict(
                "Night already has a pick and re-spinning is disabled".to_string(),
            ));
        }

        Ok(self
            .candidate_movies(&night)
            .await?
            .into_iter()
            .map(|m| Candidate::new(m.id, m.title))
            .collect())
    }

    /// Draws a winner for the night and holds it until the reveal is committed or cancelled
    pub async fn spin(&self, night_id: Uuid) -> AppResult<SelectionOutcome> {
        let candidates = self.spinnable(night_id).await?;
        let outcome = self.spins.spin(night_id, &candidates)?;
        log_spin(night_id, &candidates, &outcome);
        Ok(outcome)
    }

    /// Same as [`NightRoom::spin`] with a predetermined draw
    pub async fn spin_at(&self, night_id: Uuid, drawn: usize) -> AppResult<SelectionOutcome> {
        let candidates = self.spinnable(night_id).await?;
        let outcome = self.spins.spin_at(night_id, &candidates, drawn)?;
        log_spin(night_id, &candidates, &outcome);
        Ok(outcome)
    }

    /// Persists the pending winner as the night's pick.
    ///
    /// The outcome stays pending until the save succeeds, so a failed write can be
    /// retried without spinning again. Outcomes that can never be committed are dropped.
    pub async fn commit_spin(&self, night_id: Uuid) -> AppResult<Night> {
        let outcome = self
            .spins
            .pending(night_id)
            .ok_or_else(|| AppError::Conflict("No spin is in progress for this night".to_string()))?;

        let mut night = self.load(night_id).await?;
        if night.is_done() {
            self.spins.cancel(night_id);
            return Err(AppError::Conflict(
                "Night is already done; its pick is final".to_string(),
            ));
        }
        if !night.candidates.contains(&outcome.winner_id) {
            self.spins.cancel(night_id);
            return Err(AppError::Conflict(
                "Winning movie is no longer a candidate".to_string(),
            ));
        }

        night.set_pick(outcome.winner_id);
        self.repo.save_night(&night).await?;
        self.spins.finish(night_id);

        tracing::info!(night_id = %night_id, movie_id = %outcome.winner_id, status = %night.status, "Pick committed");
        Ok(night)
    }

    /// Drops the pending draw. Returns false when nothing was pending.
    pub fn cancel_spin(&self, night_id: Uuid) -> bool {
        let cancelled = self.spins.cancel(night_id);
        if cancelled {
            tracing::info!(night_id = %night_id, "Spin cancelled");
        }
        cancelled
    }

    pub fn pending_spin(&self, night_id: Uuid) -> Option<SelectionOutcome> {
        self.spins.pending(night_id)
    }

    /// Finishes the night, logs its pick as watched, and records the caller's score if given
    pub async fn complete(
        &self,
        night_id: Uuid,
        user_id: Uuid,
        score: Option<i64>,
        note: Option<String>,
    ) -> AppResult<Completion> {
        let score = score.map(Score::new).transpose()?;
        let mut night = self.load(night_id).await?;
        if night.is_done() {
            return Err(AppError::Conflict("Night is already done".to_string()));
        }

        if self.spins.cancel(night_id) {
            tracing::debug!(night_id = %night_id, "Pending spin abandoned by completion");
        }
        night.advance(NightStatus::Done).map_err(|current| {
            AppError::Internal(format!("Night in state {} refused to finish", current))
        })?;
        self.repo.save_night(&night).await?;

        let watched = match night.picked_movie {
            Some(movie_id) => {
                let mut entry = WatchedEntry::new(movie_id, Some(night.id), None, Utc::now());
                if let Some(score) = score {
                    entry.rate(user_id, score, note);
                }
                self.repo.insert_watched(&entry).await?;
                Some(entry)
            }
            None => None,
        };

        tracing::info!(
            night_id = %night_id,
            watched = watched.is_some(),
            rated = score.is_some(),
            "Night completed"
        );
        Ok(Completion { night, watched })
    }
}

fn log_spin(night_id: Uuid, candidates: &[Candidate], outcome: &SelectionOutcome) {
    tracing::info!(
        night_id = %night_id,
        candidates = candidates.len(),
        winner_index = outcome.winner_index,
        winner_id = %outcome.winner_id,
        rotation = outcome.rotation_degrees,
        "Spin drawn"
    );
}
