//! Ledger of processed Stripe webhook events

use sqlx::PgConnection;

use crate::utils::errors::Result;

pub struct StripeEventRepository;

impl StripeEventRepository {
    /// Record a webhook event id; `false` when it was already processed
    pub async fn record(conn: &mut PgConnection, event_id: &str, event_type: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO stripe_events (id, event_type) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
