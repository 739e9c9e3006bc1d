//! Review repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::review::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const REVIEW_COLUMNS: &str = "id, user_id, event_id, rating, comment, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, event_id: Uuid, request: CreateReviewRequest) -> Result<Review> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (user_id, event_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(request.rating)
        .bind(request.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "you have already reviewed this event"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    pub async fn list_by_event(&self, event_id: Uuid, page: Pagination) -> Result<(Vec<Review>, i64)> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE event_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(event_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((reviews, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdateReviewRequest) -> Result<Review> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating), comment = COALESCE($3, comment), updated_at = NOW()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.rating)
        .bind(request.comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("review", id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("review", id));
        }
        Ok(())
    }
}
