use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// Lifecycle of a movie night. Only ever moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NightStatus {
    Upcoming,
    Active,
    Done,
}

impl NightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NightStatus::Upcoming => "upcoming",
            NightStatus::Active => "active",
            NightStatus::Done => "done",
        }
    }

    /// Whether moving to `next` keeps the lifecycle going forward (or stays put)
    pub fn can_advance_to(&self, next: NightStatus) -> bool {
        next >= *self
    }

    pub fn is_terminal(&self) -> bool {
        *self == NightStatus::Done
    }
}

impl Display for NightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NightStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(NightStatus::Upcoming),
            "active" => Ok(NightStatus::Active),
            "done" => Ok(NightStatus::Done),
            other => Err(format!("Unknown night status: {}", other)),
        }
    }
}

/// One planned or finished group viewing session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Night {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub host_id: Uuid,
    pub status: NightStatus,
    /// Attendees in join order, host first
    pub attendees: Vec<Uuid>,
    /// Candidate movie ids in insertion order; the order lays out the wheel
    pub candidates: Vec<Uuid>,
    pub picked_movie: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Night {
    /// Creates an upcoming night with the host as its first attendee
    pub fn new(title: String, date: DateTime<Utc>, host_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            date,
            host_id,
            status: NightStatus::Upcoming,
            attendees: vec![host_id],
            candidates: Vec::new(),
            picked_movie: None,
            created_at: Utc::now(),
        }
    }

    /// Appends a candidate. Returns false if it was already on the wheel.
    pub fn add_candidate(&mut self, movie_id: Uuid) -> bool {
        if self.candidates.contains(&movie_id) {
            return false;
        }
        self.candidates.push(movie_id);
        true
    }

    /// Adds an attendee. Returns false if they had already joined.
    pub fn join(&mut self, user_id: Uuid) -> bool {
        if self.attendees.contains(&user_id) {
            return false;
        }
        self.attendees.push(user_id);
        true
    }

    /// Moves the night to `next`, refusing backward moves
    pub fn advance(&mut self, next: NightStatus) -> Result<(), NightStatus> {
        if !self.status.can_advance_to(next) {
            return Err(self.status);
        }
        self.status = next;
        Ok(())
    }

    /// Records a committed pick. An upcoming night becomes active once it has a movie.
    pub fn set_pick(&mut self, movie_id: Uuid) {
        self.picked_movie = Some(movie_id);
        if self.status == NightStatus::Upcoming {
            self.status = NightStatus::Active;
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }
}
