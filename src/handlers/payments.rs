//! Stripe webhook, payments, earnings and payouts

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, ProviderAuth, UserAuth};
use crate::models::{CreatePayoutRequest, Earnings, Payment, Payout, PayoutFilter, ProcessPayoutRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::{Result, StripeError, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};

const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Raw body is required: the signature covers the exact bytes
pub async fn webhook(
    State(services): State<ServiceFactory>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WaddleError::Stripe(StripeError::InvalidSignature("missing Stripe-Signature header".to_string()))
        })?;

    let outcome = services.payment_service.handle_webhook(&body, signature).await?;
    Ok(Json(json!({ "received": true, "outcome": format!("{:?}", outcome) })))
}

pub async fn mine(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Payment>>> {
    Ok(Json(services.payment_service.list_mine(auth.actor, page).await?))
}

pub async fn earnings(State(services): State<ServiceFactory>, auth: ProviderAuth) -> Result<Json<Earnings>> {
    Ok(Json(services.payment_service.earnings(auth.actor).await?))
}

pub async fn request_payout(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    ApiJson(request): ApiJson<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<Payout>)> {
    let payout = services.payment_service.request_payout(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

pub async fn my_payouts(
    State(services): State<ServiceFactory>,
    auth: ProviderAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Payout>>> {
    Ok(Json(services.payment_service.list_my_payouts(auth.actor, page).await?))
}

pub async fn admin_list_payouts(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(filter): Query<PayoutFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Payout>>> {
    Ok(Json(services.payment_service.list_payouts(filter.status, page).await?))
}

pub async fn admin_process_payout(
    State(services): State<ServiceFactory>,
    admin: AdminAuth,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ProcessPayoutRequest>,
) -> Result<Json<Payout>> {
    Ok(Json(services.payment_service.process_payout(admin.actor, id, request).await?))
}
