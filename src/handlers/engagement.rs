//! Likes and favorites

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::UserAuth;
use crate::models::{CreateFavoriteRequest, Favorite, Like};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn like(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Like>> {
    Ok(Json(services.engagement_service.like(auth.actor, event_id).await?))
}

pub async fn unlike(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode> {
    services.engagement_service.unlike(auth.actor, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_likes(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Like>>> {
    Ok(Json(services.engagement_service.list_likes(auth.actor, page).await?))
}

pub async fn add_favorite(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    ApiJson(request): ApiJson<CreateFavoriteRequest>,
) -> Result<Json<Favorite>> {
    Ok(Json(services.engagement_service.add_favorite(auth.actor, request).await?))
}

pub async fn my_favorites(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Favorite>>> {
    Ok(Json(services.engagement_service.list_favorites(auth.actor, page).await?))
}

pub async fn delete_favorite(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    services.engagement_service.delete_favorite(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
