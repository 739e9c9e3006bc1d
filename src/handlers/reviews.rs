//! Event reviews

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AnyAuth, UserAuth};
use crate::models::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn create(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = services.review_service.create(auth.actor, event_id, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list_for_event(
    State(services): State<ServiceFactory>,
    Path(event_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Review>>> {
    Ok(Json(services.review_service.list_for_event(event_id, page).await?))
}

pub async fn update(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateReviewRequest>,
) -> Result<Json<Review>> {
    Ok(Json(services.review_service.update(auth.actor, id, request).await?))
}

/// Authors delete their own reviews, admins any
pub async fn delete_one(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services.review_service.delete(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
