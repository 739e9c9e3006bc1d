//! Admin repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::admin::{Admin, AdminStats};
use crate::utils::errors::{Result, WaddleError};

const ADMIN_COLUMNS: &str = "id, email, password_hash, name, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new admin account
    pub async fn create(&self, email: &str, password_hash: &str, name: &str) -> Result<Admin> {
        sqlx::query_as::<_, Admin>(&format!(
            r#"
            INSERT INTO admins (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "an admin with this email already exists"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// Get system statistics
    pub async fn get_stats(&self) -> Result<AdminStats> {
        let stats = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE deleted_at IS NULL) AS users,
                (SELECT COUNT(*) FROM vendors) AS vendors,
                (SELECT COUNT(*) FROM organisers) AS organisers,
                (SELECT COUNT(*) FROM events) AS events,
                (SELECT COUNT(*) FROM bookings WHERE status = 'confirmed') AS confirmed_bookings,
                (SELECT COUNT(*) FROM disputes WHERE status <> 'resolved') AS open_disputes,
                (SELECT COUNT(*) FROM payouts WHERE status = 'pending') AS pending_payouts,
                (SELECT COUNT(*) FROM crowd_sources WHERE status = 'pending') AS pending_crowd_sources,
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments WHERE status = 'succeeded')
                    AS gross_revenue_cents
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
