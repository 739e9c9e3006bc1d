//! Dispute repository implementation

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::dispute::{CreateDisputeRequest, Dispute, DisputeStatus};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const DISPUTE_COLUMNS: &str = "id, booking_id, user_id, reason, description, status, resolution_note, \
    refund_issued, resolved_by, resolved_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct DisputeRepository {
    pool: PgPool,
}

impl DisputeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, request: CreateDisputeRequest) -> Result<Dispute> {
        sqlx::query_as::<_, Dispute>(&format!(
            r#"
            INSERT INTO disputes (booking_id, user_id, reason, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {DISPUTE_COLUMNS}
            "#
        ))
        .bind(request.booking_id)
        .bind(user_id)
        .bind(request.reason.trim())
        .bind(request.description.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "an open dispute already exists for this booking"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Dispute>> {
        let dispute = sqlx::query_as::<_, Dispute>(&format!(
            "SELECT {DISPUTE_COLUMNS} FROM disputes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dispute)
    }

    pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Dispute>> {
        let dispute = sqlx::query_as::<_, Dispute>(&format!(
            "SELECT {DISPUTE_COLUMNS} FROM disputes WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(dispute)
    }

    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<DisputeStatus>,
        page: Pagination,
    ) -> Result<(Vec<Dispute>, i64)> {
        let disputes = sqlx::query_as::<_, Dispute>(&format!(
            r#"
            SELECT {DISPUTE_COLUMNS} FROM disputes
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::dispute_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM disputes
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::dispute_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((disputes, total))
    }

    /// Apply a validated status change to a locked dispute
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: DisputeStatus,
        resolution_note: Option<&str>,
        refund_issued: bool,
        admin_id: Uuid,
    ) -> Result<Dispute> {
        let dispute = sqlx::query_as::<_, Dispute>(&format!(
            r#"
            UPDATE disputes
            SET status = $2,
                resolution_note = COALESCE($3, resolution_note),
                refund_issued = refund_issued OR $4,
                resolved_by = CASE WHEN $2 = 'resolved'::dispute_status THEN $5 ELSE resolved_by END,
                resolved_at = CASE WHEN $2 = 'resolved'::dispute_status THEN NOW() ELSE resolved_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DISPUTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(resolution_note)
        .bind(refund_issued)
        .bind(admin_id)
        .fetch_one(conn)
        .await?;

        Ok(dispute)
    }
}
