//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub stripe: StripeConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub push: PushConfig,
    pub bookings: BookingConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of this API, used to build links to locally stored uploads
    pub public_base_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Token and credential configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub password_reset_ttl_minutes: u64,
    /// Requests per minute allowed per client IP on the auth endpoints
    pub rate_limit_per_minute: u32,
}

/// Initial admin account created at startup when set
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    pub bootstrap_email: Option<String>,
    pub bootstrap_password: Option<String>,
    pub bootstrap_name: Option<String>,
}

/// Stripe configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub platform_fee_percent: u8,
    pub checkout_expiry_minutes: i64,
    pub webhook_tolerance_secs: i64,
}

/// Object storage backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

/// Upload storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_dir: String,
    /// Base URL under which stored objects are publicly reachable
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub s3: Option<S3Config>,
}

/// S3-compatible object store credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Mail transport selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Log,
    Smtp,
}

/// Mail configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Push notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
    pub enabled: bool,
    pub fcm_server_key: String,
    pub fcm_endpoint: String,
}

/// Booking rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingConfig {
    pub max_tickets_per_booking: i32,
    pub cancellation_window_hours: i64,
}

/// Background job configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    pub enabled: bool,
    pub recurrence_horizon_days: i64,
    pub recurring_events_hour_utc: u32,
    pub booking_expiry_interval_secs: u64,
    pub event_completion_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling log file; empty disables file logging
    pub file_path: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub require_event_approval: bool,
    pub require_provider_approval: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("WADDLE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::WaddleError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "http://localhost:8080".to_string(),
                cors_allowed_origins: vec![],
                request_timeout_secs: 30,
                body_limit_bytes: 12 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/waddle".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "waddle:".to_string(),
                ttl_seconds: 3600,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                token_ttl_minutes: 60 * 24 * 7,
                password_reset_ttl_minutes: 15,
                rate_limit_per_minute: 20,
            },
            admin: AdminConfig::default(),
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: String::new(),
                api_base: "https://api.stripe.com".to_string(),
                currency: "gbp".to_string(),
                success_url: "http://localhost:3000/bookings/success?session_id={CHECKOUT_SESSION_ID}".to_string(),
                cancel_url: "http://localhost:3000/bookings/cancelled".to_string(),
                platform_fee_percent: 10,
                checkout_expiry_minutes: 30,
                webhook_tolerance_secs: 300,
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                local_dir: "uploads".to_string(),
                public_base_url: "http://localhost:8080/uploads".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
                s3: None,
            },
            mail: MailConfig {
                provider: MailProvider::Log,
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from_email: "no-reply@waddle.local".to_string(),
                from_name: "Waddle".to_string(),
            },
            push: PushConfig {
                enabled: false,
                fcm_server_key: String::new(),
                fcm_endpoint: "https://fcm.googleapis.com/fcm/send".to_string(),
            },
            bookings: BookingConfig {
                max_tickets_per_booking: 10,
                cancellation_window_hours: 24,
            },
            jobs: JobsConfig {
                enabled: true,
                recurrence_horizon_days: 60,
                recurring_events_hour_utc: 2,
                booking_expiry_interval_secs: 300,
                event_completion_interval_secs: 900,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: String::new(),
                json: false,
            },
            features: FeaturesConfig {
                require_event_approval: true,
                require_provider_approval: true,
            },
        }
    }
}
