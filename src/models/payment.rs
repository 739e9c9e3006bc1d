//! Payment and payout models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{EventOwner, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::optional_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Succeeded) | (Pending, Failed) | (Succeeded, Refunded)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub amount_cents: i64,
    pub platform_fee_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Paid,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    pub id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub organiser_id: Option<Uuid>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PayoutStatus,
    pub stripe_transfer_id: Option<String>,
    pub note: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    pub fn owner(&self) -> Option<EventOwner> {
        match (self.vendor_id, self.organiser_id) {
            (Some(id), _) => Some(EventOwner::Vendor(id)),
            (None, Some(id)) => Some(EventOwner::Organiser(id)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayoutRequest {
    pub amount_cents: i64,
    pub note: Option<String>,
}

impl Validate for CreatePayoutRequest {
    fn validate(&self) -> Result<()> {
        if self.amount_cents <= 0 {
            return Err(WaddleError::Validation("amount_cents must be positive".to_string()));
        }
        optional_text("note", self.note.as_deref(), 1000)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPayoutRequest {
    pub status: PayoutStatus,
    pub note: Option<String>,
}

impl Validate for ProcessPayoutRequest {
    fn validate(&self) -> Result<()> {
        if self.status == PayoutStatus::Pending {
            return Err(WaddleError::Validation("status must be paid or rejected".to_string()));
        }
        optional_text("note", self.note.as_deref(), 1000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayoutFilter {
    pub status: Option<PayoutStatus>,
}

/// Balance sheet of a provider account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Earnings {
    pub currency: String,
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
    pub net_cents: i64,
    pub paid_out_cents: i64,
    pub pending_payout_cents: i64,
    pub available_cents: i64,
}

impl Earnings {
    pub fn compute(
        currency: String,
        gross_cents: i64,
        platform_fee_cents: i64,
        paid_out_cents: i64,
        pending_payout_cents: i64,
    ) -> Self {
        let net_cents = gross_cents - platform_fee_cents;
        Self {
            currency,
            gross_cents,
            platform_fee_cents,
            net_cents,
            paid_out_cents,
            pending_payout_cents,
            available_cents: (net_cents - paid_out_cents - pending_payout_cents).max(0),
        }
    }
}
