//! Data models module
//!
//! This module contains all data structures used throughout the application:
//! database rows, request payloads and their validation.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod booking;
pub mod crowd_source;
pub mod dispute;
pub mod engagement;
pub mod event;
pub mod notification;
pub mod organiser;
pub mod payment;
pub mod review;
pub mod user;
pub mod vendor;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::Result;

// Re-export commonly used models
pub use activity::{Activity, ActivityFilter, CreateActivityRequest, UpdateActivityRequest};
pub use admin::{Admin, AdminStats, CreateAdminRequest};
pub use auth::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
    SignupRequest,
};
pub use booking::{Booking, BookingCheckout, BookingFilter, BookingStatus, CreateBookingRequest};
pub use crowd_source::{
    CreateCrowdSourceRequest, CrowdSource, CrowdSourceFilter, CrowdSourceKind, CrowdSourceStatus,
    ReviewCrowdSourceRequest,
};
pub use dispute::{CreateDisputeRequest, Dispute, DisputeFilter, DisputeStatus, UpdateDisputeStatusRequest};
pub use engagement::{CreateFavoriteRequest, Favorite, Like};
pub use event::{
    CreateEventRequest, Event, EventDetails, EventFilter, EventOwner, EventStatus, ModerateEventRequest,
    ModerationFilter, ModerationStatus, Recurrence, UpdateEventRequest,
};
pub use notification::{
    Audience, BroadcastRequest, DeviceTokenRequest, NewNotification, Notification, NotificationFilter,
};
pub use organiser::{CreateOrganiserRequest, Organiser, UpdateOrganiserRequest};
pub use payment::{
    CreatePayoutRequest, Earnings, Payment, PaymentStatus, Payout, PayoutFilter, PayoutStatus,
    ProcessPayoutRequest,
};
pub use review::{CreateReviewRequest, Review, UpdateReviewRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, User};
pub use vendor::{CreateVendorRequest, UpdateVendorRequest, Vendor};

/// Account type carried in every access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Parent / customer
    User,
    Vendor,
    Organiser,
    Admin,
}

impl Role {
    /// Table holding accounts of this role
    pub fn table(&self) -> &'static str {
        match self {
            Role::User => "users",
            Role::Vendor => "vendors",
            Role::Organiser => "organisers",
            Role::Admin => "admins",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Organiser => "organiser",
            Role::Admin => "admin",
        }
    }

    /// Vendors and organisers own events, activities and payouts
    pub fn is_provider(&self) -> bool {
        matches!(self, Role::Vendor | Role::Organiser)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input validation implemented by every request payload
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Organiser).unwrap(), "\"organiser\"");
        let role: Role = serde_json::from_str("\"vendor\"").unwrap();
        assert_eq!(role, Role::Vendor);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_role_tables() {
        assert_eq!(Role::User.table(), "users");
        assert_eq!(Role::Admin.table(), "admins");
        assert!(Role::Vendor.is_provider());
        assert!(!Role::User.is_provider());
    }
}
