//! Booking model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
            BookingStatus::Expired => "expired",
        }
    }

    /// Whether seats are held against the event capacity
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Expired)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
        )
    }

    pub fn transition(self, next: BookingStatus) -> Result<BookingStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(WaddleError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub status: BookingStatus,
    #[serde(skip_serializing)]
    pub stripe_session_id: Option<String>,
    #[serde(skip_serializing)]
    pub stripe_payment_intent_id: Option<String>,
    pub checkout_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    pub quantity: i32,
}

impl Validate for CreateBookingRequest {
    fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(WaddleError::Validation("quantity must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub event_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Response of a booking creation
#[derive(Debug, Clone, Serialize)]
pub struct BookingCheckout {
    pub booking: Booking,
    pub checkout_url: Option<String>,
}

/// Total price of `quantity` seats, `None` on overflow
pub fn booking_total(unit_price_cents: i64, quantity: i32) -> Option<i64> {
    unit_price_cents.checked_mul(i64::from(quantity))
}

/// Platform share of a payment, rounded half up
pub fn platform_fee(amount_cents: i64, fee_percent: u8) -> i64 {
    (amount_cents * i64::from(fee_percent) + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_booking_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Expired));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Refunded));

        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Refunded));
        assert!(!Expired.can_transition_to(Confirmed));
        assert!(!Refunded.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Pending));

        assert_matches!(
            Expired.transition(Confirmed),
            Err(WaddleError::InvalidStateTransition { .. })
        );
        assert_eq!(Pending.transition(Confirmed).unwrap(), Confirmed);
    }

    #[test]
    fn test_seat_holding() {
        assert!(BookingStatus::Pending.holds_seats());
        assert!(BookingStatus::Confirmed.holds_seats());
        assert!(!BookingStatus::Expired.holds_seats());
    }

    #[test]
    fn test_pricing() {
        assert_eq!(booking_total(1250, 3), Some(3750));
        assert_eq!(booking_total(i64::MAX, 2), None);
        assert_eq!(platform_fee(1000, 10), 100);
        assert_eq!(platform_fee(1005, 10), 101);
        assert_eq!(platform_fee(999, 0), 0);
    }

    #[test]
    fn test_quantity_validation() {
        let req = CreateBookingRequest {
            event_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(req.validate().is_err());
    }
}
