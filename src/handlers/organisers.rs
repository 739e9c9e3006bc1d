//! Organiser accounts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::{ApiJson, ApprovalRequest, BanRequest, SearchQuery};
use crate::middleware::{AdminAuth, ProviderAuth};
use crate::models::{Organiser, Role, UpdateOrganiserRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};

fn require_organiser(auth: &ProviderAuth) -> Result<()> {
    if auth.actor.role != Role::Organiser {
        return Err(WaddleError::PermissionDenied("organiser account required".to_string()));
    }
    Ok(())
}

pub async fn list(
    State(services): State<ServiceFactory>,
    Query(search): Query<SearchQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Organiser>>> {
    Ok(Json(services.organiser_service.list_public(search.term(), page).await?))
}

pub async fn get_one(State(services): State<ServiceFactory>, Path(id): Path<Uuid>) -> Result<Json<Organiser>> {
    Ok(Json(services.organiser_service.get_public(id).await?))
}

pub async fn me(State(services): State<ServiceFactory>, auth: ProviderAuth) -> Result<Json<Organiser>> {
    require_organiser(&auth)?;
    Ok(Json(services.organiser_service.get(auth.actor.id).await?))
}

pub async fn update_me(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    ApiJson(request): ApiJson<UpdateOrganiserRequest>,
) -> Result<Json<Organiser>> {
    require_organiser(&auth)?;
    Ok(Json(services.organiser_service.update_profile(auth.actor, request).await?))
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(search): Query<SearchQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Organiser>>> {
    Ok(Json(services.organiser_service.list_all(search.term(), page).await?))
}

pub async fn admin_approval(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<Organiser>> {
    Ok(Json(
        services
            .organiser_service
            .set_approval(admin.actor, id, request.approved)
            .await?,
    ))
}

pub async fn admin_ban(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<BanRequest>,
) -> Result<Json<Organiser>> {
    Ok(Json(
        services
            .organiser_service
            .set_banned(admin.actor, id, request.banned)
            .await?,
    ))
}
