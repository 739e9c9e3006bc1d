//! Likes and favorites repositories

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::engagement::{Favorite, Like};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

#[derive(Debug, Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Like an event; repeated likes return the existing row
    pub async fn like(&self, user_id: Uuid, event_id: Uuid) -> Result<Like> {
        sqlx::query(
            "INSERT INTO likes (user_id, event_id) VALUES ($1, $2) ON CONFLICT (user_id, event_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        let like = sqlx::query_as::<_, Like>(
            "SELECT id, user_id, event_id, created_at FROM likes WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(like)
    }

    /// Remove a like; `false` if there was none
    pub async fn unlike(&self, user_id: Uuid, event_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_user(&self, user_id: Uuid, page: Pagination) -> Result<(Vec<Like>, i64)> {
        let likes = sqlx::query_as::<_, Like>(
            r#"
            SELECT id, user_id, event_id, created_at FROM likes
            WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((likes, total))
    }
}

const FAVORITE_COLUMNS: &str = "id, user_id, event_id, activity_id, created_at";

#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Favorite an event or an activity; idempotent per target
    pub async fn add(&self, user_id: Uuid, event_id: Option<Uuid>, activity_id: Option<Uuid>) -> Result<Favorite> {
        sqlx::query(
            "INSERT INTO favorites (user_id, event_id, activity_id) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(activity_id)
        .execute(&self.pool)
        .await?;

        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            SELECT {FAVORITE_COLUMNS} FROM favorites
            WHERE user_id = $1
              AND event_id IS NOT DISTINCT FROM $2
              AND activity_id IS NOT DISTINCT FROM $3
            "#
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(favorite)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(favorite)
    }

    pub async fn list_by_user(&self, user_id: Uuid, page: Pagination) -> Result<(Vec<Favorite>, i64)> {
        let favorites = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((favorites, total))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("favorite", id));
        }
        Ok(())
    }
}
