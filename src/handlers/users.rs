//! Parent accounts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{ApiJson, BanRequest, SearchQuery};
use crate::middleware::{AdminAuth, UserAuth};
use crate::models::{UpdateUserRequest, User};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn me(State(services): State<ServiceFactory>, auth: UserAuth) -> Result<Json<User>> {
    Ok(Json(services.user_service.get(auth.actor.id).await?))
}

pub async fn update_me(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    Ok(Json(services.user_service.update_profile(auth.actor, request).await?))
}

pub async fn delete_me(State(services): State<ServiceFactory>, auth: UserAuth) -> Result<StatusCode> {
    services.user_service.delete_account(auth.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(search): Query<SearchQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<User>>> {
    Ok(Json(services.user_service.list(search.term(), page).await?))
}

pub async fn admin_get(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<User>> {
    Ok(Json(services.user_service.get(id).await?))
}

pub async fn admin_ban(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<BanRequest>,
) -> Result<Json<User>> {
    Ok(Json(services.user_service.set_banned(admin.actor, id, request.banned).await?))
}
