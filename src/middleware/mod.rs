//! Middleware module
//!
//! This module contains authentication extractors, rate limiting and request
//! logging for the HTTP API

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{AdminAuth, AnyAuth, Authenticated, MaybeAuth, ProviderAuth, ProviderOrAdminAuth, UserAuth};
pub use logging::{http_trace_layer, log_requests};
pub use rate_limit::{client_ip, rate_limit_middleware, IpRateLimiter};
