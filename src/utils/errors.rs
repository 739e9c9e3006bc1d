//! Error handling for Waddle
//!
//! This module defines the main error type used throughout the application,
//! its mapping onto HTTP responses, and the severity used when logging it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for Waddle
#[derive(Error, Debug)]
pub enum WaddleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Stripe API specific errors
#[derive(Error, Debug)]
pub enum StripeError {
    #[error("Stripe API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Stripe response: {0}")]
    InvalidResponse(String),

    #[error("Webhook signature invalid: {0}")]
    InvalidSignature(String),
}

/// Result type alias for Waddle operations
pub type Result<T> = std::result::Result<T, WaddleError>;

impl WaddleError {
    /// Shorthand for a missing row
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        WaddleError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Map a database error, turning unique violations into conflicts
    pub fn from_db(err: sqlx::Error, conflict_message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                WaddleError::Conflict(conflict_message.to_string())
            }
            _ => WaddleError::Database(err),
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            WaddleError::NotFound { .. } => StatusCode::NOT_FOUND,
            WaddleError::BadRequest(_)
            | WaddleError::Validation(_)
            | WaddleError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            WaddleError::Stripe(StripeError::InvalidSignature(_)) => StatusCode::BAD_REQUEST,
            WaddleError::Authentication(_) | WaddleError::Token(_) => StatusCode::UNAUTHORIZED,
            WaddleError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            WaddleError::Conflict(_) => StatusCode::CONFLICT,
            WaddleError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            WaddleError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            WaddleError::Stripe(_) => StatusCode::BAD_GATEWAY,
            WaddleError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            WaddleError::NotFound { .. } => "NOT_FOUND",
            WaddleError::BadRequest(_) => "BAD_REQUEST",
            WaddleError::Validation(_) => "VALIDATION_ERROR",
            WaddleError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            WaddleError::Stripe(StripeError::InvalidSignature(_)) => "INVALID_SIGNATURE",
            WaddleError::Authentication(_) | WaddleError::Token(_) => "UNAUTHORIZED",
            WaddleError::PermissionDenied(_) => "FORBIDDEN",
            WaddleError::Conflict(_) => "CONFLICT",
            WaddleError::RateLimitExceeded => "RATE_LIMITED",
            WaddleError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            WaddleError::Stripe(_) => "PAYMENT_PROVIDER_ERROR",
            WaddleError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WaddleError::Database(_) => ErrorSeverity::Critical,
            WaddleError::Migration(_) => ErrorSeverity::Critical,
            WaddleError::Config(_) => ErrorSeverity::Critical,
            WaddleError::PermissionDenied(_) => ErrorSeverity::Warning,
            WaddleError::Authentication(_) | WaddleError::Token(_) => ErrorSeverity::Warning,
            WaddleError::RateLimitExceeded => ErrorSeverity::Warning,
            WaddleError::Stripe(StripeError::InvalidSignature(_)) => ErrorSeverity::Warning,
            WaddleError::NotFound { .. }
            | WaddleError::BadRequest(_)
            | WaddleError::Validation(_)
            | WaddleError::Conflict(_)
            | WaddleError::InvalidStateTransition { .. }
            | WaddleError::PayloadTooLarge(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message safe to show to API clients
    fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            match self {
                WaddleError::Stripe(_) => "Payment provider request failed".to_string(),
                WaddleError::ServiceUnavailable(msg) => msg.clone(),
                _ => "An internal error occurred".to_string(),
            }
        } else {
            match self {
                WaddleError::Token(_) => "Invalid or expired token".to_string(),
                WaddleError::BadRequest(msg)
                | WaddleError::Validation(msg)
                | WaddleError::Authentication(msg)
                | WaddleError::PermissionDenied(msg)
                | WaddleError::Conflict(msg)
                | WaddleError::PayloadTooLarge(msg) => msg.clone(),
                other => other.to_string(),
            }
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Error response body (JSON)
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for WaddleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(status = %status, severity = %self.severity(), error = %self, "Request failed");
            }
            ErrorSeverity::Warning => {
                tracing::warn!(status = %status, error = %self, "Request rejected");
            }
            ErrorSeverity::Info => {
                tracing::debug!(status = %status, error = %self, "Request rejected");
            }
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_and_status() {
        let err = WaddleError::not_found("Event", "42");
        assert_eq!(err.to_string(), "Event with id 42 not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = WaddleError::Validation("email is invalid".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "email is invalid");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = WaddleError::Config("jwt secret missing".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "An internal error occurred");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            WaddleError::Authentication("missing token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WaddleError::PermissionDenied("vendors only".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(WaddleError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_invalid_signature_is_bad_request() {
        let err = WaddleError::from(StripeError::InvalidSignature("mismatch".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_SIGNATURE");

        let upstream = WaddleError::from(StripeError::Api { status: 500, message: "boom".into() });
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.public_message(), "Payment provider request failed");
    }

    #[test]
    fn test_state_transition_error() {
        let err = WaddleError::InvalidStateTransition {
            from: "pending".into(),
            to: "resolved".into(),
        };
        assert_eq!(err.to_string(), "Invalid state transition: pending -> resolved");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
