//! In-app notifications and device tokens

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, AnyAuth};
use crate::models::{BroadcastRequest, DeviceTokenRequest, Notification, NotificationFilter};
use crate::services::notification::BroadcastSummary;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn list(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Query(filter): Query<NotificationFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Notification>>> {
    Ok(Json(services.notification_service.list(auth.actor, filter, page).await?))
}

pub async fn mark_read(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>> {
    Ok(Json(services.notification_service.mark_read(auth.actor, id).await?))
}

pub async fn mark_all_read(State(services): State<ServiceFactory>, auth: AnyAuth) -> Result<Json<Value>> {
    let updated = services.notification_service.mark_all_read(auth.actor).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_one(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services.notification_service.delete(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_device_token(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    ApiJson(request): ApiJson<DeviceTokenRequest>,
) -> Result<StatusCode> {
    services.notification_service.set_device_token(auth.actor, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn broadcast(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    ApiJson(request): ApiJson<BroadcastRequest>,
) -> Result<Json<BroadcastSummary>> {
    Ok(Json(services.notification_service.broadcast(admin.actor, request).await?))
}
