//! Activities

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::ProviderOrAdminAuth;
use crate::models::{Activity, ActivityFilter, CreateActivityRequest, UpdateActivityRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn list(
    State(services): State<ServiceFactory>,
    Query(filter): Query<ActivityFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Activity>>> {
    Ok(Json(services.activity_service.list(filter, page).await?))
}

pub async fn get_one(State(services): State<ServiceFactory>, Path(id): Path<Uuid>) -> Result<Json<Activity>> {
    Ok(Json(services.activity_service.get(id).await?))
}

pub async fn create(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    ApiJson(request): ApiJson<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>)> {
    let activity = services.activity_service.create(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateActivityRequest>,
) -> Result<Json<Activity>> {
    Ok(Json(services.activity_service.update(auth.actor, id, request).await?))
}

pub async fn delete_one(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services.activity_service.delete(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
