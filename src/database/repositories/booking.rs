//! Booking repository implementation

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingFilter, BookingStatus};
use crate::utils::errors::Result;
use crate::utils::helpers::Pagination;

const BOOKING_COLUMNS: &str = "id, user_id, event_id, quantity, unit_price_cents, total_cents, \
    currency, status, stripe_session_id, stripe_payment_intent_id, checkout_url, expires_at, \
    confirmed_at, cancelled_at, created_at, updated_at";

/// Values of a booking about to be inserted
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(conn: &mut PgConnection, booking: NewBooking) -> Result<Booking> {
        let confirmed_at = (booking.status == BookingStatus::Confirmed).then(Utc::now);
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (user_id, event_id, quantity, unit_price_cents, total_cents,
                currency, status, expires_at, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.quantity)
        .bind(booking.unit_price_cents)
        .bind(booking.total_cents)
        .bind(booking.currency)
        .bind(booking.status)
        .bind(booking.expires_at)
        .bind(confirmed_at)
        .fetch_one(conn)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_session_for_update(
        conn: &mut PgConnection,
        session_id: &str,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE stripe_session_id = $1 FOR UPDATE"
        ))
        .bind(session_id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_payment_intent_for_update(
        conn: &mut PgConnection,
        payment_intent_id: &str,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE stripe_payment_intent_id = $1 FOR UPDATE"
        ))
        .bind(payment_intent_id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// Attach a Stripe checkout session to a pending booking
    /// Attach the checkout session; the booking expires with it
    pub async fn set_checkout(
        &self,
        id: Uuid,
        session_id: &str,
        checkout_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET stripe_session_id = $2, checkout_url = $3, expires_at = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(session_id)
        .bind(checkout_url)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Move a booking from `from` to `to`; `None` if it was no longer in `from`
    pub async fn transition(
        conn: &mut PgConnection,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        payment_intent_id: Option<&str>,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $3,
                stripe_payment_intent_id = COALESCE($4, stripe_payment_intent_id),
                confirmed_at = CASE WHEN $3 = 'confirmed'::booking_status THEN NOW() ELSE confirmed_at END,
                cancelled_at = CASE WHEN $3 = 'confirmed'::booking_status THEN cancelled_at ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(payment_intent_id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    pub async fn list_by_user(&self, user_id: Uuid, page: Pagination) -> Result<(Vec<Booking>, i64)> {
        self.list(
            &BookingFilter {
                user_id: Some(user_id),
                ..Default::default()
            },
            page,
        )
        .await
    }

    pub async fn list_by_event(&self, event_id: Uuid, page: Pagination) -> Result<(Vec<Booking>, i64)> {
        self.list(
            &BookingFilter {
                event_id: Some(event_id),
                ..Default::default()
            },
            page,
        )
        .await
    }

    pub async fn list(&self, filter: &BookingFilter, page: Pagination) -> Result<(Vec<Booking>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::booking_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR event_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
        "#;

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings {WHERE} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(filter.status)
        .bind(filter.event_id)
        .bind(filter.user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bookings {WHERE}"))
            .bind(filter.status)
            .bind(filter.event_id)
            .bind(filter.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    /// Pending bookings whose checkout window has closed
    pub async fn expired_pending(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE status = 'pending' AND expires_at IS NOT NULL AND expires_at < $1
            ORDER BY expires_at
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Bookings still holding seats on an event
    pub async fn active_for_event(&self, event_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = $1 AND status IN ('pending', 'confirmed')"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn has_confirmed(&self, user_id: Uuid, event_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE user_id = $1 AND event_id = $2 AND status = 'confirmed')",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
