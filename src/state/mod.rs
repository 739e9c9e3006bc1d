//! Application state shared by every request handler

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Settings;
use crate::middleware::rate_limit::IpRateLimiter;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub settings: Arc<Settings>,
    /// Guards the unauthenticated credential endpoints
    pub auth_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(services: ServiceFactory, settings: Settings) -> Self {
        let auth_limiter = IpRateLimiter::per_minute(settings.auth.rate_limit_per_minute);
        Self {
            services,
            settings: Arc::new(settings),
            auth_limiter,
        }
    }
}

impl FromRef<AppState> for ServiceFactory {
    fn from_ref(state: &AppState) -> Self {
        state.services.clone()
    }
}

impl FromRef<AppState> for IpRateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.auth_limiter.clone()
    }
}
