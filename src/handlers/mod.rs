//! HTTP handlers
//!
//! One module per resource. Handlers extract and authorize the request and
//! delegate to the matching service; [`router`] assembles the whole API.

pub mod activities;
pub mod admin;
pub mod auth;
pub mod bookings;
pub mod crowd_sources;
pub mod disputes;
pub mod engagement;
pub mod events;
pub mod health;
pub mod notifications;
pub mod organisers;
pub mod payments;
pub mod reviews;
pub mod uploads;
pub mod users;
pub mod vendors;

use std::time::Duration;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tracing::warn;

use crate::config::{Settings, StorageBackend};
use crate::middleware::{http_trace_layer, log_requests, rate_limit_middleware};
use crate::state::AppState;
use crate::utils::errors::WaddleError;

/// JSON body whose rejections are reported in the API error format
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WaddleError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(WaddleError::BadRequest(rejection.body_text())),
        }
    }
}

/// `?q=` free text search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Body of the ban and approval toggles
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BanRequest {
    pub banned: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit_middleware,
        ));

    limited.route("/change-password", post(auth::change_password))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/admins", post(admin::create_admin))
        .route("/users", get(users::admin_list))
        .route("/users/:id", get(users::admin_get))
        .route("/users/:id/ban", patch(users::admin_ban))
        .route("/vendors", get(vendors::admin_list))
        .route("/vendors/:id/approval", patch(vendors::admin_approval))
        .route("/vendors/:id/ban", patch(vendors::admin_ban))
        .route("/organisers", get(organisers::admin_list))
        .route("/organisers/:id/approval", patch(organisers::admin_approval))
        .route("/organisers/:id/ban", patch(organisers::admin_ban))
        .route("/events", get(events::admin_list))
        .route("/events/:id/moderation", patch(events::admin_moderate))
        .route("/bookings", get(bookings::admin_list))
        .route("/payouts", get(payments::admin_list_payouts))
        .route("/payouts/:id", patch(payments::admin_process_payout))
        .route("/disputes", get(disputes::admin_list))
        .route("/disputes/:id/status", patch(disputes::admin_update_status))
        .route("/notifications/broadcast", post(notifications::broadcast))
        .route("/crowdsources", get(crowd_sources::admin_list))
        .route("/crowdsources/:id", patch(crowd_sources::admin_review))
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state))
        .nest("/admin", admin_routes())
        // Accounts
        .route(
            "/users/me",
            get(users::me).patch(users::update_me).delete(users::delete_me),
        )
        .route("/vendors", get(vendors::list))
        .route("/vendors/me", get(vendors::me).patch(vendors::update_me))
        .route("/vendors/:id", get(vendors::get_one))
        .route("/organisers", get(organisers::list))
        .route("/organisers/me", get(organisers::me).patch(organisers::update_me))
        .route("/organisers/:id", get(organisers::get_one))
        // Events
        .route("/events", get(events::list).post(events::create))
        .route("/events/mine", get(events::mine))
        .route(
            "/events/:id",
            get(events::get_one).patch(events::update).delete(events::delete_one),
        )
        .route("/events/:id/publish", post(events::publish))
        .route("/events/:id/cancel", post(events::cancel))
        .route("/events/:id/bookings", get(bookings::for_event))
        .route(
            "/events/:id/reviews",
            get(reviews::list_for_event).post(reviews::create),
        )
        .route(
            "/events/:id/likes",
            post(engagement::like).delete(engagement::unlike),
        )
        // Bookings and payments
        .route("/bookings", post(bookings::create))
        .route("/bookings/me", get(bookings::mine))
        .route("/bookings/:id", get(bookings::get_one))
        .route("/bookings/:id/cancel", post(bookings::cancel))
        .route("/payments/webhook", post(payments::webhook))
        .route("/payments/me", get(payments::mine))
        .route("/payments/earnings", get(payments::earnings))
        .route("/payouts", post(payments::request_payout))
        .route("/payouts/me", get(payments::my_payouts))
        // Activities, reviews and engagement
        .route("/activities", get(activities::list).post(activities::create))
        .route(
            "/activities/:id",
            get(activities::get_one)
                .patch(activities::update)
                .delete(activities::delete_one),
        )
        .route("/reviews/:id", patch(reviews::update).delete(reviews::delete_one))
        .route("/likes/me", get(engagement::my_likes))
        .route("/favorites", post(engagement::add_favorite))
        .route("/favorites/me", get(engagement::my_favorites))
        .route("/favorites/:id", delete(engagement::delete_favorite))
        // Disputes
        .route("/disputes", post(disputes::create))
        .route("/disputes/me", get(disputes::mine))
        .route("/disputes/:id", get(disputes::get_one))
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/device-token", put(notifications::set_device_token))
        .route("/notifications/:id", delete(notifications::delete_one))
        .route("/notifications/:id/read", patch(notifications::mark_read))
        // Uploads and crowd sources
        .route("/uploads/images", post(uploads::upload_image))
        .route("/crowdsources", get(crowd_sources::list_verified).post(crowd_sources::submit))
        .route("/crowdsources/me", get(crowd_sources::mine))
}

/// Build the complete router
pub fn router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api/v1", api_routes(&state));

    if settings.storage.backend == StorageBackend::Local {
        app = app.nest_service("/uploads", ServeDir::new(&settings.storage.local_dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(http_trace_layer())
            .layer(cors_layer(&settings))
            .layer(TimeoutLayer::new(Duration::from_secs(settings.server.request_timeout_secs)))
            .layer(DefaultBodyLimit::max(settings.server.body_limit_bytes))
            .layer(middleware::from_fn(log_requests)),
    )
    .with_state(state)
}
