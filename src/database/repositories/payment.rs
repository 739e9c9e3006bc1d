//! Payment repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::event::EventOwner;
use crate::models::payment::{Payment, PaymentStatus};
use crate::utils::errors::Result;
use crate::utils::helpers::Pagination;

const PAYMENT_COLUMNS: &str = "id, booking_id, user_id, amount_cents, platform_fee_cents, currency, \
    status, stripe_payment_intent_id, refunded_at, created_at, updated_at";

/// Succeeded payment totals of one provider
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct RevenueTotals {
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        conn: &mut PgConnection,
        booking_id: Uuid,
        user_id: Uuid,
        amount_cents: i64,
        platform_fee_cents: i64,
        currency: &str,
    ) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (booking_id, user_id, amount_cents, platform_fee_cents, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(user_id)
        .bind(amount_cents)
        .bind(platform_fee_cents)
        .bind(currency)
        .fetch_one(conn)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Move the payment of a booking between statuses if it is still in `from`
    pub async fn transition(
        conn: &mut PgConnection,
        booking_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_intent_id: Option<&str>,
    ) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $3,
                stripe_payment_intent_id = COALESCE($4, stripe_payment_intent_id),
                refunded_at = CASE WHEN $3 = 'refunded'::payment_status THEN NOW() ELSE refunded_at END,
                updated_at = NOW()
            WHERE booking_id = $1 AND status = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(payment_intent_id)
        .fetch_optional(conn)
        .await?;

        Ok(payment)
    }

    pub async fn list_by_user(&self, user_id: Uuid, page: Pagination) -> Result<(Vec<Payment>, i64)> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((payments, total))
    }

    /// Succeeded payments for events owned by a provider
    pub async fn revenue_for_owner(&self, owner: EventOwner) -> Result<RevenueTotals> {
        let column = match owner {
            EventOwner::Vendor(_) => "vendor_id",
            EventOwner::Organiser(_) => "organiser_id",
        };
        let totals = sqlx::query_as::<_, RevenueTotals>(&format!(
            r#"
            SELECT COALESCE(SUM(p.amount_cents), 0)::BIGINT AS gross_cents,
                   COALESCE(SUM(p.platform_fee_cents), 0)::BIGINT AS platform_fee_cents
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            JOIN events e ON e.id = b.event_id
            WHERE p.status = 'succeeded' AND e.{column} = $1
            "#
        ))
        .bind(owner.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
