//! Bookings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::middleware::{AdminAuth, AnyAuth, ProviderOrAdminAuth, UserAuth};
use crate::models::{Booking, BookingCheckout, BookingFilter, CreateBookingRequest};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};

pub async fn create(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCheckout>)> {
    let checkout = services.booking_service.create(auth.actor, request).await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

pub async fn mine(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Booking>>> {
    Ok(Json(services.booking_service.list_mine(auth.actor, page).await?))
}

pub async fn get_one(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(services.booking_service.get(auth.actor, id).await?))
}

pub async fn for_event(
    State(services): State<ServiceFactory>,
    auth: ProviderOrAdminAuth,
    Path(event_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Booking>>> {
    Ok(Json(
        services
            .booking_service
            .list_for_event(auth.actor, event_id, page)
            .await?,
    ))
}

pub async fn cancel(
    State(services): State<ServiceFactory>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(services.booking_service.cancel(auth.actor, id).await?))
}

pub async fn admin_list(
    State(services): State<ServiceFactory>,
    _admin: AdminAuth,
    Query(filter): Query<BookingFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Paginated<Booking>>> {
    Ok(Json(services.booking_service.list_all(filter, page).await?))
}
