//! Waddle
//!
//! REST API for an event-booking marketplace: parents book events published by
//! vendors and organisers, admins moderate content, disputes and payouts.

pub mod config;
pub mod database;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, WaddleError};

pub use database::DatabaseService;
pub use handlers::router;
pub use jobs::JobScheduler;
pub use services::ServiceFactory;
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
