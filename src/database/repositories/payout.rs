//! Payout repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::event::EventOwner;
use crate::models::payment::{Payout, PayoutStatus};
use crate::utils::errors::Result;
use crate::utils::helpers::Pagination;

const PAYOUT_COLUMNS: &str = "id, vendor_id, organiser_id, amount_cents, currency, status, \
    stripe_transfer_id, note, processed_by, processed_at, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct PayoutTotals {
    pub paid_cents: i64,
    pub pending_cents: i64,
}

#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: PgPool,
}

fn owner_column(owner: EventOwner) -> &'static str {
    match owner {
        EventOwner::Vendor(_) => "vendor_id",
        EventOwner::Organiser(_) => "organiser_id",
    }
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serialize payout requests of one provider by locking its account row
    pub async fn lock_owner(conn: &mut PgConnection, owner: EventOwner) -> Result<()> {
        let table = owner.role().table();
        sqlx::query(&format!("SELECT id FROM {table} WHERE id = $1 FOR UPDATE"))
            .bind(owner.id())
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn create(
        conn: &mut PgConnection,
        owner: EventOwner,
        amount_cents: i64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<Payout> {
        let payout = sqlx::query_as::<_, Payout>(&format!(
            r#"
            INSERT INTO payouts (vendor_id, organiser_id, amount_cents, currency, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYOUT_COLUMNS}
            "#
        ))
        .bind(owner.vendor_id())
        .bind(owner.organiser_id())
        .bind(amount_cents)
        .bind(currency)
        .bind(note)
        .fetch_one(conn)
        .await?;

        Ok(payout)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payout>> {
        let payout = sqlx::query_as::<_, Payout>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payout)
    }

    pub async fn list_by_owner(&self, owner: EventOwner, page: Pagination) -> Result<(Vec<Payout>, i64)> {
        let column = owner_column(owner);
        let payouts = sqlx::query_as::<_, Payout>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE {column} = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner.id())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM payouts WHERE {column} = $1"))
            .bind(owner.id())
            .fetch_one(&self.pool)
            .await?;

        Ok((payouts, total))
    }

    pub async fn list(&self, status: Option<PayoutStatus>, page: Pagination) -> Result<(Vec<Payout>, i64)> {
        let payouts = sqlx::query_as::<_, Payout>(&format!(
            r#"
            SELECT {PAYOUT_COLUMNS} FROM payouts
            WHERE ($1::payout_status IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payouts WHERE ($1::payout_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((payouts, total))
    }

    pub async fn totals_for_owner(conn: &mut PgConnection, owner: EventOwner) -> Result<PayoutTotals> {
        let column = owner_column(owner);
        let totals = sqlx::query_as::<_, PayoutTotals>(&format!(
            r#"
            SELECT COALESCE(SUM(amount_cents) FILTER (WHERE status = 'paid'), 0)::BIGINT AS paid_cents,
                   COALESCE(SUM(amount_cents) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending_cents
            FROM payouts
            WHERE {column} = $1
            "#
        ))
        .bind(owner.id())
        .fetch_one(conn)
        .await?;

        Ok(totals)
    }

    /// Settle a pending payout; `None` if it was already processed
    pub async fn process(
        &self,
        id: Uuid,
        status: PayoutStatus,
        admin_id: Uuid,
        note: Option<&str>,
        transfer_id: Option<&str>,
    ) -> Result<Option<Payout>> {
        let payout = sqlx::query_as::<_, Payout>(&format!(
            r#"
            UPDATE payouts
            SET status = $2, processed_by = $3, note = COALESCE($4, note),
                stripe_transfer_id = $5, processed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYOUT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(admin_id)
        .bind(note)
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payout)
    }
}
