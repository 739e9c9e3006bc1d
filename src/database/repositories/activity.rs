//! Activity repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityFilter, CreateActivityRequest, UpdateActivityRequest};
use crate::models::event::EventOwner;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const ACTIVITY_COLUMNS: &str = "id, title, description, category, address, city, image_url, \
    min_age, max_age, price_note, vendor_id, organiser_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an activity; `owner` is `None` for admin-created entries
    pub async fn create(&self, owner: Option<EventOwner>, request: CreateActivityRequest) -> Result<Activity> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            r#"
            INSERT INTO activities (title, description, category, address, city, image_url,
                min_age, max_age, price_note, vendor_id, organiser_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.category.trim())
        .bind(request.address)
        .bind(request.city)
        .bind(request.image_url)
        .bind(request.min_age)
        .bind(request.max_age)
        .bind(request.price_note)
        .bind(owner.and_then(|o| o.vendor_id()))
        .bind(owner.and_then(|o| o.organiser_id()))
        .fetch_one(&self.pool)
        .await?;

        Ok(activity)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(activity)
    }

    pub async fn list(&self, filter: &ActivityFilter, page: Pagination) -> Result<(Vec<Activity>, i64)> {
        fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
            qb.push(" WHERE TRUE");
            if let Some(category) = filter.category.as_ref().filter(|c| !c.trim().is_empty()) {
                qb.push(" AND category ILIKE ").push_bind(category.trim().to_string());
            }
            if let Some(city) = filter.city.as_ref().filter(|c| !c.trim().is_empty()) {
                qb.push(" AND city ILIKE ").push_bind(city.trim().to_string());
            }
            if let Some(q) = filter.q.as_ref().filter(|q| !q.trim().is_empty()) {
                let pattern = format!("%{}%", q.trim());
                qb.push(" AND (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ACTIVITY_COLUMNS} FROM activities"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY title LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let activities = qb.build_query_as::<Activity>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activities");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((activities, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdateActivityRequest) -> Result<Activity> {
        sqlx::query_as::<_, Activity>(&format!(
            r#"
            UPDATE activities
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                image_url = COALESCE($7, image_url),
                min_age = COALESCE($8, min_age),
                max_age = COALESCE($9, max_age),
                price_note = COALESCE($10, price_note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.title.map(|v| v.trim().to_string()))
        .bind(request.description)
        .bind(request.category.map(|v| v.trim().to_string()))
        .bind(request.address)
        .bind(request.city)
        .bind(request.image_url)
        .bind(request.min_age)
        .bind(request.max_age)
        .bind(request.price_note)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("activity", id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("activity", id));
        }
        Ok(())
    }
}
