//! Crowd-sourced listings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, UserAuth};
use crate::models::{CreateCrowdSourceRequest, CrowdSource, CrowdSourceFilter, ReviewCrowdSourceRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn submit(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    ApiJson(request): ApiJson<CreateCrowdSourceRequest>,
) -> Result<(StatusCode, Json<CrowdSource>)> {
    let entry = services.crowd_source_service.submit(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn mine(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<CrowdSource>>> {
    Ok(Json(services.crowd_source_service.list_mine(auth.actor, page).await?))
}

pub async fn list_verified(
    State(services): State<ServiceFactory>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<CrowdSource>>> {
    Ok(Json(services.crowd_source_service.list_verified(page).await?))
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(filter): Query<CrowdSourceFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<CrowdSource>>> {
    Ok(Json(services.crowd_source_service.list_all(filter, page).await?))
}

pub async fn admin_review(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ReviewCrowdSourceRequest>,
) -> Result<Json<CrowdSource>> {
    Ok(Json(services.crowd_source_service.review(admin.actor, id, request).await?))
}
