//! Vendor accounts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::{ApiJson, ApprovalRequest, BanRequest, SearchQuery};
use crate::middleware::{AdminAuth, ProviderAuth};
use crate::models::{Role, UpdateVendorRequest, Vendor};
use crate::services::ServiceFactory;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};

fn require_vendor(auth: &ProviderAuth) -> Result<()> {
    if auth.actor.role != Role::Vendor {
        return Err(WaddleError::PermissionDenied("vendor account required".to_string()));
    }
    Ok(())
}

pub async fn list(
    State(services): State<ServiceFactory>,
    Query(search): Query<SearchQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Vendor>>> {
    Ok(Json(services.vendor_service.list_public(search.term(), page).await?))
}

pub async fn get_one(State(services): State<ServiceFactory>, Path(id): Path<Uuid>) -> Result<Json<Vendor>> {
    Ok(Json(services.vendor_service.get_public(id).await?))
}

pub async fn me(State(services): State<ServiceFactory>, auth: ProviderAuth) -> Result<Json<Vendor>> {
    require_vendor(&auth)?;
    Ok(Json(services.vendor_service.get(auth.actor.id).await?))
}

pub async fn update_me(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    ApiJson(request): ApiJson<UpdateVendorRequest>,
) -> Result<Json<Vendor>> {
    require_vendor(&auth)?;
    Ok(Json(services.vendor_service.update_profile(auth.actor, request).await?))
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(search): Query<SearchQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Vendor>>> {
    Ok(Json(services.vendor_service.list_all(search.term(), page).await?))
}

pub async fn admin_approval(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<Vendor>> {
    Ok(Json(
        services
            .vendor_service
            .set_approval(admin.actor, id, request.approved)
            .await?,
    ))
}

pub async fn admin_ban(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<BanRequest>,
) -> Result<Json<Vendor>> {
    Ok(Json(services.vendor_service.set_banned(admin.actor, id, request.banned).await?))
}
