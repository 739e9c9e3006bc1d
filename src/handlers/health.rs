//! Liveness and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::services::ServiceFactory;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// 503 unless the database answers
pub async fn ready(State(services): State<ServiceFactory>) -> (StatusCode, Json<Value>) {
    let status = services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": if status.is_healthy() { "ready" } else { "unavailable" },
            "database": status.database_healthy,
            "redis": status.redis_healthy,
            "issues": status.get_issues(),
        })),
    )
}
