//! Services module
//!
//! This module contains business logic services and the clients of external
//! systems they talk to (Stripe, mail, push, object storage, Redis).

pub mod activity;
pub mod admin;
pub mod auth;
pub mod booking;
pub mod crowd_source;
pub mod dispute;
pub mod engagement;
pub mod event;
pub mod mail;
pub mod notification;
pub mod organiser;
pub mod payment;
pub mod push;
pub mod recurrence;
pub mod redis;
pub mod review;
pub mod storage;
pub mod stripe;
pub mod user;
pub mod vendor;

// Re-export commonly used services
pub use activity::ActivityService;
pub use admin::AdminService;
pub use auth::{AuthService, Claims, TokenService};
pub use booking::BookingService;
pub use crowd_source::CrowdSourceService;
pub use dispute::DisputeService;
pub use engagement::EngagementService;
pub use event::EventService;
pub use mail::{build_mailer, Mailer, SharedMailer};
pub use notification::NotificationService;
pub use organiser::OrganiserService;
pub use payment::{PaymentService, WebhookOutcome};
pub use push::PushSender;
pub use redis::RedisService;
pub use review::ReviewService;
pub use storage::{build_storage, ObjectStorage, SharedStorage, StoredObject, UploadService};
pub use stripe::StripeClient;
pub use user::UserService;
pub use vendor::VendorService;

use tracing::warn;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub db: DatabaseService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub vendor_service: VendorService,
    pub organiser_service: OrganiserService,
    pub admin_service: AdminService,
    pub event_service: EventService,
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
    pub activity_service: ActivityService,
    pub review_service: ReviewService,
    pub engagement_service: EngagementService,
    pub dispute_service: DisputeService,
    pub notification_service: NotificationService,
    pub upload_service: UploadService,
    pub crowd_source_service: CrowdSourceService,
    pub redis_service: RedisService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory, building external clients from settings
    pub fn new(db: DatabaseService, settings: Settings) -> Result<Self> {
        let redis_service = RedisService::new(&settings.redis)?;
        let stripe = StripeClient::new(&settings.stripe)?;
        let mailer = build_mailer(&settings.mail)?;
        let push = PushSender::new(&settings.push)?;
        let storage = build_storage(&settings.storage)?;

        Ok(Self::with_clients(db, settings, redis_service, stripe, mailer, push, storage))
    }

    /// Wire services around already constructed clients
    pub fn with_clients(
        db: DatabaseService,
        settings: Settings,
        redis_service: RedisService,
        stripe: StripeClient,
        mailer: SharedMailer,
        push: PushSender,
        storage: SharedStorage,
    ) -> Self {
        let tokens = TokenService::new(&settings.auth.jwt_secret, settings.auth.token_ttl_minutes);
        let notification_service = NotificationService::new(db.clone(), push);
        let booking_service = BookingService::new(
            db.clone(),
            stripe.clone(),
            notification_service.clone(),
            mailer.clone(),
            settings.clone(),
        );

        Self {
            auth_service: AuthService::new(db.clone(), redis_service.clone(), mailer, tokens, settings.clone()),
            user_service: UserService::new(db.clone()),
            vendor_service: VendorService::new(db.clone(), notification_service.clone()),
            organiser_service: OrganiserService::new(db.clone(), notification_service.clone()),
            admin_service: AdminService::new(db.clone()),
            event_service: EventService::new(
                db.clone(),
                booking_service.clone(),
                notification_service.clone(),
                settings.clone(),
            ),
            payment_service: PaymentService::new(
                db.clone(),
                stripe,
                booking_service.clone(),
                notification_service.clone(),
                settings.clone(),
            ),
            activity_service: ActivityService::new(db.clone()),
            review_service: ReviewService::new(db.clone()),
            engagement_service: EngagementService::new(db.clone()),
            dispute_service: DisputeService::new(db.clone(), booking_service.clone(), notification_service.clone()),
            crowd_source_service: CrowdSourceService::new(db.clone(), notification_service.clone()),
            upload_service: UploadService::new(storage, &settings.storage),
            booking_service,
            notification_service,
            redis_service,
            db,
        }
    }

    /// Health check for the backing stores
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = match self.db.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        };
        let redis_healthy = match self.redis_service.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "Redis health check failed");
                false
            }
        };

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
        }
    }
}

/// Health status of the backing stores
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
}

impl ServiceHealthStatus {
    /// Only the database is critical; Redis backs password resets alone
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
