use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A movie someone wants the group to watch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
    /// Users who upvoted, in voting order
    pub upvotes: Vec<Uuid>,
    pub note: Option<String>,
}

impl WatchlistEntry {
    pub fn new(movie_id: Uuid, added_by: Uuid, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            movie_id,
            added_by,
            added_at: Utc::now(),
            upvotes: Vec::new(),
            note,
        }
    }

    /// Flips `user_id`'s upvote. Returns true if the user now upvotes the entry.
    pub fn toggle_upvote(&mut self, user_id: Uuid) -> bool {
        if let Some(pos) = self.upvotes.iter().position(|id| *id == user_id) {
            self.upvotes.remove(pos);
            false
        } else {
            self.upvotes.push(user_id);
            true
        }
    }

    pub fn upvote_count(&self) -> usize {
        self.upvotes.len()
    }
}
