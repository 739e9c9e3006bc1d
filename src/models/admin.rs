//! Admin model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{is_valid_email, require_text, validate_password};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Validate for CreateAdminRequest {
    fn validate(&self) -> Result<()> {
        if !is_valid_email(self.email.trim()) {
            return Err(WaddleError::Validation("email is invalid".to_string()));
        }
        validate_password(&self.password)?;
        require_text("name", &self.name, 200)
    }
}

/// Platform-wide counters shown on the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct AdminStats {
    pub users: i64,
    pub vendors: i64,
    pub organisers: i64,
    pub events: i64,
    pub confirmed_bookings: i64,
    pub open_disputes: i64,
    pub pending_payouts: i64,
    pub pending_crowd_sources: i64,
    pub gross_revenue_cents: i64,
}
