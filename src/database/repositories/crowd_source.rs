//! Crowd source repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::crowd_source::{CreateCrowdSourceRequest, CrowdSource, CrowdSourceStatus};
use crate::utils::errors::Result;
use crate::utils::helpers::Pagination;

const CROWD_SOURCE_COLUMNS: &str = "id, submitted_by, kind, title, description, address, city, \
    website, image_url, starts_at, status, review_note, reviewed_by, reviewed_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CrowdSourceRepository {
    pool: PgPool,
}

impl CrowdSourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, request: CreateCrowdSourceRequest) -> Result<CrowdSource> {
        let entry = sqlx::query_as::<_, CrowdSource>(&format!(
            r#"
            INSERT INTO crowd_sources (submitted_by, kind, title, description, address, city,
                website, image_url, starts_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CROWD_SOURCE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(request.kind)
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.address)
        .bind(request.city)
        .bind(request.website)
        .bind(request.image_url)
        .bind(request.starts_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CrowdSource>> {
        let entry = sqlx::query_as::<_, CrowdSource>(&format!(
            "SELECT {CROWD_SOURCE_COLUMNS} FROM crowd_sources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn list(
        &self,
        submitted_by: Option<Uuid>,
        status: Option<CrowdSourceStatus>,
        page: Pagination,
    ) -> Result<(Vec<CrowdSource>, i64)> {
        let entries = sqlx::query_as::<_, CrowdSource>(&format!(
            r#"
            SELECT {CROWD_SOURCE_COLUMNS} FROM crowd_sources
            WHERE ($1::uuid IS NULL OR submitted_by = $1)
              AND ($2::crowd_source_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(submitted_by)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM crowd_sources
            WHERE ($1::uuid IS NULL OR submitted_by = $1)
              AND ($2::crowd_source_status IS NULL OR status = $2)
            "#,
        )
        .bind(submitted_by)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((entries, total))
    }

    /// Review a pending entry; `None` if it was already reviewed
    pub async fn review(
        &self,
        id: Uuid,
        status: CrowdSourceStatus,
        admin_id: Uuid,
        note: Option<&str>,
    ) -> Result<Option<CrowdSource>> {
        let entry = sqlx::query_as::<_, CrowdSource>(&format!(
            r#"
            UPDATE crowd_sources
            SET status = $2, reviewed_by = $3, review_note = $4, reviewed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {CROWD_SOURCE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(admin_id)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}
