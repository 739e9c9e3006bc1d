//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Role, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::require_text;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_role: Role,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification about to be stored and pushed
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub recipient_role: Role,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub data: serde_json::Value,
}

impl NewNotification {
    pub fn new(
        recipient_id: Uuid,
        recipient_role: Role,
        kind: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            recipient_role,
            title: title.into(),
            body: body.into(),
            kind: kind.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Users,
    Vendors,
    Organisers,
    All,
}

impl Audience {
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Audience::Users => &[Role::User],
            Audience::Vendors => &[Role::Vendor],
            Audience::Organisers => &[Role::Organiser],
            Audience::All => &[Role::User, Role::Vendor, Role::Organiser],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    pub audience: Audience,
    pub title: String,
    pub body: String,
}

impl Validate for BroadcastRequest {
    fn validate(&self) -> Result<()> {
        require_text("title", &self.title, 200)?;
        require_text("body", &self.body, 2000)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTokenRequest {
    pub token: Option<String>,
}

impl Validate for DeviceTokenRequest {
    fn validate(&self) -> Result<()> {
        match &self.token {
            Some(token) if token.trim().is_empty() || token.len() > 4096 => Err(
                WaddleError::Validation("token must be between 1 and 4096 characters".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Notification kinds
pub mod kinds {
    pub const BOOKING_CONFIRMED: &str = "booking_confirmed";
    pub const BOOKING_CANCELLED: &str = "booking_cancelled";
    pub const BOOKING_REFUNDED: &str = "booking_refunded";
    pub const EVENT_CANCELLED: &str = "event_cancelled";
    pub const EVENT_MODERATED: &str = "event_moderated";
    pub const DISPUTE_UPDATED: &str = "dispute_updated";
    pub const PAYOUT_UPDATED: &str = "payout_updated";
    pub const CROWD_SOURCE_REVIEWED: &str = "crowd_source_reviewed";
    pub const ACCOUNT_UPDATED: &str = "account_updated";
    pub const BROADCAST: &str = "broadcast";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_roles() {
        assert_eq!(Audience::All.roles().len(), 3);
        assert!(!Audience::All.roles().contains(&Role::Admin));
        let audience: Audience = serde_json::from_str("\"organisers\"").unwrap();
        assert_eq!(audience.roles(), &[Role::Organiser]);
    }

    #[test]
    fn test_device_token_validation() {
        assert!(DeviceTokenRequest { token: Some("abc".into()) }.validate().is_ok());
        assert!(DeviceTokenRequest { token: None }.validate().is_ok());
        assert!(DeviceTokenRequest { token: Some(" ".into()) }.validate().is_err());
    }
}
