//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::settings::{MailProvider, StorageBackend};
use super::Settings;
use crate::utils::errors::{Result, WaddleError};

const MIN_JWT_SECRET_LEN: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_admin_config(&settings.admin)?;
    validate_stripe_config(&settings.stripe)?;
    validate_storage_config(&settings.storage)?;
    validate_mail_config(&settings.mail)?;
    validate_push_config(&settings.push)?;
    validate_booking_config(&settings.bookings)?;
    validate_jobs_config(&settings.jobs)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn config_error(message: impl Into<String>) -> WaddleError {
    WaddleError::Config(message.into())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(config_error("Server port must be greater than 0"));
    }

    url::Url::parse(&config.public_base_url)
        .map_err(|e| config_error(format!("Invalid server public_base_url: {}", e)))?;

    if config.request_timeout_secs == 0 {
        return Err(config_error("Request timeout must be greater than 0"));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(config_error("Database URL is required"));
    }

    if config.max_connections == 0 {
        return Err(config_error("Max connections must be greater than 0"));
    }

    if config.min_connections > config.max_connections {
        return Err(config_error("Min connections cannot be greater than max connections"));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(config_error("Redis URL is required"));
    }

    Ok(())
}

/// Validate token settings
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        return Err(config_error(format!(
            "JWT secret must be at least {} characters",
            MIN_JWT_SECRET_LEN
        )));
    }

    if config.token_ttl_minutes <= 0 {
        return Err(config_error("Token TTL must be greater than 0"));
    }

    if config.password_reset_ttl_minutes == 0 {
        return Err(config_error("Password reset TTL must be greater than 0"));
    }

    if config.rate_limit_per_minute == 0 {
        return Err(config_error("Auth rate limit must be greater than 0"));
    }

    Ok(())
}

/// Validate bootstrap admin settings
fn validate_admin_config(config: &super::AdminConfig) -> Result<()> {
    match (&config.bootstrap_email, &config.bootstrap_password) {
        (Some(_), None) | (None, Some(_)) => Err(config_error(
            "Bootstrap admin requires both email and password",
        )),
        (Some(_), Some(password)) if password.len() < 8 => Err(config_error(
            "Bootstrap admin password must be at least 8 characters",
        )),
        _ => Ok(()),
    }
}

/// Validate Stripe configuration
fn validate_stripe_config(config: &super::StripeConfig) -> Result<()> {
    if config.secret_key.is_empty() {
        return Err(config_error("Stripe secret key is required"));
    }

    if config.webhook_secret.is_empty() {
        return Err(config_error("Stripe webhook secret is required"));
    }

    if config.currency.len() != 3 {
        return Err(config_error("Stripe currency must be a 3-letter ISO code"));
    }

    if config.platform_fee_percent > 100 {
        return Err(config_error("Platform fee percent cannot exceed 100"));
    }

    // Stripe refuses checkout sessions expiring in under 30 minutes
    if !(30..=24 * 60).contains(&config.checkout_expiry_minutes) {
        return Err(config_error("Checkout expiry must be between 30 and 1440 minutes"));
    }

    if config.webhook_tolerance_secs <= 0 {
        return Err(config_error("Webhook tolerance must be greater than 0"));
    }

    url::Url::parse(&config.api_base)
        .map_err(|e| config_error(format!("Invalid Stripe api_base: {}", e)))?;

    Ok(())
}

/// Validate upload storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.max_upload_bytes == 0 {
        return Err(config_error("Max upload size must be greater than 0"));
    }

    match config.backend {
        StorageBackend::Local => {
            if config.local_dir.is_empty() {
                return Err(config_error("Local storage directory is required"));
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| config_error("S3 settings are required for the s3 backend"))?;

            url::Url::parse(&s3.endpoint)
                .map_err(|e| config_error(format!("Invalid S3 endpoint: {}", e)))?;

            if s3.bucket.is_empty() || s3.access_key_id.is_empty() || s3.secret_access_key.is_empty() {
                return Err(config_error("S3 bucket and credentials are required"));
            }
        }
    }

    if config.public_base_url.is_empty() {
        return Err(config_error("Storage public base URL is required"));
    }

    Ok(())
}

/// Validate mail configuration
fn validate_mail_config(config: &super::MailConfig) -> Result<()> {
    if config.from_email.is_empty() {
        return Err(config_error("Mail sender address is required"));
    }

    if config.provider == MailProvider::Smtp && config.smtp_host.is_empty() {
        return Err(config_error("SMTP host is required for the smtp provider"));
    }

    Ok(())
}

/// Validate push configuration
fn validate_push_config(config: &super::PushConfig) -> Result<()> {
    if config.enabled && config.fcm_server_key.is_empty() {
        return Err(config_error("FCM server key is required when push is enabled"));
    }

    Ok(())
}

/// Validate booking rules
fn validate_booking_config(config: &super::BookingConfig) -> Result<()> {
    if config.max_tickets_per_booking < 1 {
        return Err(config_error("Max tickets per booking must be at least 1"));
    }

    if config.cancellation_window_hours < 0 {
        return Err(config_error("Cancellation window cannot be negative"));
    }

    Ok(())
}

/// Validate background job configuration
fn validate_jobs_config(config: &super::JobsConfig) -> Result<()> {
    if config.recurring_events_hour_utc > 23 {
        return Err(config_error("Recurring events hour must be between 0 and 23"));
    }

    if config.recurrence_horizon_days < 1 {
        return Err(config_error("Recurrence horizon must be at least 1 day"));
    }

    if config.booking_expiry_interval_secs == 0 || config.event_completion_interval_secs == 0 {
        return Err(config_error("Job intervals must be greater than 0"));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(config_error("Log level is required"));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(config_error(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::S3Config;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "a".repeat(40);
        settings.stripe.secret_key = "sk_test_123".to_string();
        settings.stripe.webhook_secret = "whsec_test".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_default_settings_require_secrets() {
        let result = validate_settings(&Settings::default());
        assert!(matches!(result, Err(WaddleError::Config(msg)) if msg.contains("JWT secret")));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = valid_settings();
        settings.auth.jwt_secret = "short".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_pool_bounds() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_fee_percent_bound() {
        let mut settings = valid_settings();
        settings.stripe.platform_fee_percent = 101;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_s3_backend_requires_settings() {
        let mut settings = valid_settings();
        settings.storage.backend = StorageBackend::S3;
        assert!(validate_settings(&settings).is_err());

        settings.storage.s3 = Some(S3Config {
            endpoint: "https://account.r2.cloudflarestorage.com".to_string(),
            bucket: "waddle".to_string(),
            region: "auto".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
        });
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_smtp_requires_host() {
        let mut settings = valid_settings();
        settings.mail.provider = MailProvider::Smtp;
        assert!(validate_settings(&settings).is_err());
        settings.mail.smtp_host = "smtp.example.com".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_half_configured_bootstrap_admin_rejected() {
        let mut settings = valid_settings();
        settings.admin.bootstrap_email = Some("root@waddle.test".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let raw = include_str!("../../config.example.toml");
        let settings: Settings = toml::from_str(raw).expect("example config should parse");
        assert_eq!(settings.server.port, 8080);
        assert!(validate_settings(&settings).is_ok());
    }
}
