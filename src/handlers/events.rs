//! Event listings and lifecycle

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, MaybeAuth, ProviderAuth, ProviderOrAdminAuth};
use crate::models::{
    CreateEventRequest, Event, EventDetails, EventFilter, ModerateEventRequest, ModerationFilter,
    UpdateEventRequest,
};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn create(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = services.event_service.create(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list(
    State(services): State<ServiceFactory>,
    Query(filter): Query<EventFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Event>>> {
    Ok(Json(services.event_service.list_public(filter, page).await?))
}

pub async fn mine(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Event>>> {
    Ok(Json(services.event_service.list_mine(auth.actor, page).await?))
}

pub async fn get_one(
    State(services): State<ServiceFactory>,
    MaybeAuth(actor): MaybeAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDetails>> {
    Ok(Json(services.event_service.get(actor, id).await?))
}

pub async fn update(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    Ok(Json(services.event_service.update(auth.actor, id, request).await?))
}

pub async fn publish(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>> {
    Ok(Json(services.event_service.publish(auth.actor, id).await?))
}

pub async fn cancel(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>> {
    Ok(Json(services.event_service.cancel(auth.actor, id).await?))
}

pub async fn delete_one(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services.event_service.delete(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(filter): Query<ModerationFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Event>>> {
    Ok(Json(
        services
            .event_service
            .list_for_moderation(filter.moderation_status, page)
            .await?,
    ))
}

pub async fn admin_moderate(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ModerateEventRequest>,
) -> Result<Json<Event>> {
    Ok(Json(services.event_service.moderate(admin.actor, id, request).await?))
}
