//! Disputes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, AnyAuth, UserAuth};
use crate::models::{CreateDisputeRequest, Dispute, DisputeFilter, UpdateDisputeStatusRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn create(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    ApiJson(request): ApiJson<CreateDisputeRequest>,
) -> Result<(StatusCode, Json<Dispute>)> {
    let dispute = services.dispute_service.create(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(dispute)))
}

pub async fn mine(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Dispute>>> {
    Ok(Json(services.dispute_service.list_mine(auth.actor, page).await?))
}

pub async fn get_one(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Dispute>> {
    Ok(Json(services.dispute_service.get(auth.actor, id).await?))
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(filter): Query<DisputeFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Dispute>>> {
    Ok(Json(services.dispute_service.list_all(filter, page).await?))
}

pub async fn admin_update_status(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateDisputeStatusRequest>,
) -> Result<Json<Dispute>> {
    Ok(Json(services.dispute_service.update_status(admin.actor, id, request).await?))
}
