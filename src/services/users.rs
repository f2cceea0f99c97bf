use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{User, UserStats},
};

/// Profile fields a user may set on themselves
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

/// Creates or updates the caller's profile, keeping the original join date
pub async fn upsert_profile(
    repo: &dyn Repository,
    user_id: Uuid,
    update: ProfileUpdate,
) -> AppResult<User> {
    let mut user = repo
        .get_user(user_id)
        .await?
        .unwrap_or_else(|| User::new(user_id));

    user.name = update.name.or(user.name);
    user.email = update.email.or(user.email);
    user.avatar = update.avatar.or(user.avatar);

    repo.upsert_user(&user).await?;
    Ok(user)
}

pub async fn get_user(repo: &dyn Repository, user_id: Uuid) -> AppResult<User> {
    repo.get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

pub async fn list_users(repo: &dyn Repository) -> AppResult<Vec<User>> {
    repo.list_users().await
}

/// Counts the group's watched movies and summarizes `user_id`'s ratings across them
pub async fn user_stats(repo: &dyn Repository, user_id: Uuid) -> AppResult<UserStats> {
    let entries = repo.list_watched().await?;
    let scores: Vec<u32> = entries
        .iter()
        .filter_map(|e| e.rating_by(&user_id))
        .map(|r| r.score.value() as u32)
        .collect();

    let avg_rating = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<u32>() as f64 / scores.len() as f64
    };

    Ok(UserStats {
        movies_watched: entries.len(),
        ratings_given: scores.len(),
        avg_rating,
    })
}
