//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Waddle application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::models::Role;
use crate::utils::errors::{Result, WaddleError};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file appender on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = if config.file_path.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::daily(&config.file_path, "waddle.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed();
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| WaddleError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log account actions with structured data
pub fn log_account_action(account_id: Uuid, role: Role, action: &str, details: Option<&str>) {
    info!(
        account_id = %account_id,
        role = %role,
        action = action,
        details = details,
        "Account action performed"
    );
}

/// Log booking lifecycle changes
pub fn log_booking_event(booking_id: Uuid, event_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        booking_id = %booking_id,
        event_id = %event_id,
        action = action,
        details = details,
        "Booking event occurred"
    );
}

/// Log payment provider interactions
pub fn log_payment_event(reference: &str, action: &str, amount_cents: Option<i64>, success: bool) {
    if success {
        info!(
            reference = reference,
            action = action,
            amount_cents = amount_cents,
            "Payment event processed"
        );
    } else {
        error!(
            reference = reference,
            action = action,
            amount_cents = amount_cents,
            "Payment event failed"
        );
    }
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log API errors from third-party services
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log background job runs
pub fn log_job_run(job: &str, affected: u64, duration_ms: u64, success: bool) {
    if success {
        debug!(
            job = job,
            affected = affected,
            duration_ms = duration_ms,
            "Background job completed"
        );
    } else {
        error!(job = job, duration_ms = duration_ms, "Background job failed");
    }
}
