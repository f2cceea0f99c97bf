use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of the group. The id is the handle issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            email: None,
            avatar: None,
            created_at: Utc::now(),
        }
    }
}

/// Viewing statistics for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    /// Every movie the group has logged as watched
    pub movies_watched: usize,
    pub ratings_given: usize,
    /// Mean of the user's scores, 0 when they have not rated anything
    pub avg_rating: f64,
}
