//! Admin accounts and dashboard

use axum::{extract::State, http::StatusCode, Json};

use super::ApiJson;
use crate::middleware::AdminAuth;
use crate::models::{Admin, AdminStats, CreateAdminRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

pub async fn create_admin(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    ApiJson(request): ApiJson<CreateAdminRequest>,
) -> Result<(StatusCode, Json<Admin>)> {
    let created = services.admin_service.create_admin(admin.actor, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn stats(State(services): State<ServiceFactory>, _admin: AdminAuth) -> Result<Json<AdminStats>> {
    Ok(Json(services.admin_service.stats().await?))
}
