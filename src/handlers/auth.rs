//! Signup, login and password management

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::ApiJson;
use crate::middleware::AnyAuth;
use crate::models::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
    SignupRequest,
};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

pub async fn signup(
    State(services): State<ServiceFactory>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = services.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(services): State<ServiceFactory>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(services.auth_service.login(request).await?))
}

/// Always 202 so the response does not reveal whether an account exists
pub async fn forgot_password(
    State(services): State<ServiceFactory>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    services.auth_service.forgot_password(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "If the account exists, a reset code has been sent" })),
    ))
}

pub async fn reset_password(
    State(services): State<ServiceFactory>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    services.auth_service.reset_password(request).await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn change_password(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    services.auth_service.change_password(auth.actor, request).await?;
    Ok(StatusCode::NO_CONTENT)
}
