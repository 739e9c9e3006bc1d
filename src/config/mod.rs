//! Configuration management module
//!
//! This module handles loading and validation of application configuration
//! from TOML files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{
    AdminConfig, AuthConfig, BookingConfig, DatabaseConfig, FeaturesConfig, JobsConfig, LoggingConfig,
    MailConfig, MailProvider, PushConfig, RedisConfig, S3Config, ServerConfig, Settings, StorageBackend,
    StorageConfig, StripeConfig,
};
