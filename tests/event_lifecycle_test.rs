//! Recurring series, provider standing and uploads against PostgreSQL
//!
//! Each test skips itself when no database can be started.

mod fixtures;
mod helpers;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serial_test::serial;
use uuid::Uuid;

use helpers::{TestApp, TestDatabase};
use waddle::database::repositories::EventRepository;
use waddle::database::run_migrations;
use waddle::models::{
    Actor, BookingStatus, CreateBookingRequest, CreateEventRequest, EventFilter, EventStatus, Recurrence,
};
use waddle::utils::{Pagination, WaddleError};

/// Daily series starting in two weeks with `days` generated occurrences
fn daily_series(days: i64) -> CreateEventRequest {
    let mut request = fixtures::event_request(0, 10);
    request.recurrence = Recurrence::Daily;
    request.recurrence_until = Some(request.starts_at + Duration::days(days));
    request
}

async fn occurrence_ids(app: &TestApp, parent_id: Uuid) -> Vec<Uuid> {
    sqlx::query_scalar("SELECT id FROM events WHERE parent_event_id = $1 ORDER BY starts_at")
        .bind(parent_id)
        .fetch_all(app.pool())
        .await
        .unwrap()
}

async fn book(app: &TestApp, parent: Actor, event_id: Uuid) -> Result<BookingStatus, WaddleError> {
    app.services
        .booking_service
        .create(
            parent,
            CreateBookingRequest {
                event_id,
                quantity: 1,
            },
        )
        .await
        .map(|checkout| checkout.booking.status)
}

#[tokio::test]
#[serial]
async fn test_occurrence_generation_is_idempotent() {
    let Some(db) = TestDatabase::start().await else { return };
    let app = TestApp::with_database(&db, "http://127.0.0.1:1").await;
    let services = &app.services;
    let vendor = fixtures::vendor(services).await;
    let series = fixtures::list_event(services, vendor, daily_series(3)).await;

    let now = Utc::now();
    let created = services.event_service.generate_occurrences(now).await.unwrap();
    assert!(created >= 3);
    assert_eq!(occurrence_ids(&app, series.id).await.len(), 3);

    let again = services.event_service.generate_occurrences(now).await.unwrap();
    assert_eq!(again, 0);
    assert_eq!(occurrence_ids(&app, series.id).await.len(), 3);

    for id in occurrence_ids(&app, series.id).await {
        let occurrence = services.db.events.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(occurrence.status, EventStatus::Published);
        assert_eq!(occurrence.parent_event_id, Some(series.id));
        assert_eq!(occurrence.recurrence, Recurrence::None);
        assert_eq!(occurrence.ends_at - occurrence.starts_at, series.ends_at - series.starts_at);
    }
}

#[tokio::test]
#[serial]
async fn test_series_with_booked_occurrence_cannot_be_deleted() {
    let Some(db) = TestDatabase::start().await else { return };
    let app = TestApp::with_database(&db, "http://127.0.0.1:1").await;
    let services = &app.services;
    let vendor = fixtures::vendor(services).await;
    let series = fixtures::list_event(services, vendor, daily_series(4)).await;
    services.event_service.generate_occurrences(Utc::now()).await.unwrap();

    let occurrences = occurrence_ids(&app, series.id).await;
    assert_eq!(occurrences.len(), 4);
    let parent = fixtures::parent(services).await;
    assert_eq!(book(&app, parent, occurrences[1]).await.unwrap(), BookingStatus::Confirmed);

    let result = services.event_service.delete(vendor, series.id).await;
    assert_matches!(result, Err(WaddleError::Conflict(_)));
    assert!(services.db.events.find_by_id(series.id).await.unwrap().is_some());

    // cancelling the series cancels every occurrence and voids the booking
    services.event_service.cancel(vendor, series.id).await.unwrap();
    for id in &occurrences {
        let occurrence = services.db.events.find_by_id(*id).await.unwrap().unwrap();
        assert_eq!(occurrence.status, EventStatus::Cancelled);
    }
    let bookings = services
        .booking_service
        .list_mine(parent, Pagination::default())
        .await
        .unwrap();
    assert_eq!(bookings.items[0].status, BookingStatus::Cancelled);
    assert_matches!(book(&app, parent, occurrences[2]).await, Err(WaddleError::BadRequest(_)));

    // only historic bookings remain, so the whole series can go
    services.event_service.delete(vendor, series.id).await.unwrap();
    assert!(services.db.events.find_by_id(series.id).await.unwrap().is_none());
    for id in occurrences {
        assert!(services.db.events.find_by_id(id).await.unwrap().is_none());
    }
}

#[tokio::test]
#[serial]
async fn test_booking_waits_for_series_lock() {
    let Some(db) = TestDatabase::start().await else { return };
    let app = TestApp::with_database(&db, "http://127.0.0.1:1").await;
    let services = &app.services;
    let vendor = fixtures::vendor(services).await;
    let event = fixtures::list_event(services, vendor, fixtures::event_request(0, 5)).await;
    let parent = fixtures::parent(services).await;

    let mut tx = app.pool().begin().await.unwrap();
    let locked = EventRepository::lock_series(&mut *tx, event.id).await.unwrap();
    assert_eq!(locked, vec![event.id]);

    let booking_service = services.booking_service.clone();
    let event_id = event.id;
    let booking = tokio::spawn(async move {
        booking_service
            .create(
                parent,
                CreateBookingRequest {
                    event_id,
                    quantity: 1,
                },
            )
            .await
    });

    // the seat reservation updates the locked row, so it waits
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!booking.is_finished());

    tx.rollback().await.unwrap();
    let checkout = booking.await.unwrap().unwrap();
    assert_eq!(checkout.booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
#[serial]
async fn test_unapproved_provider_cannot_sell() {
    let Some(db) = TestDatabase::start().await else { return };
    let app = TestApp::with_database(&db, "http://127.0.0.1:1").await;
    let services = &app.services;
    assert!(app.settings.features.require_provider_approval);

    let newcomer = fixtures::unapproved_vendor(services).await;
    let result = services
        .event_service
        .create(newcomer, fixtures::event_request(0, 5))
        .await;
    assert_matches!(result, Err(WaddleError::PermissionDenied(_)));

    // approval withdrawn after listing
    let vendor = fixtures::vendor(services).await;
    let event = fixtures::list_event(services, vendor, fixtures::event_request(0, 5)).await;
    services.db.vendors.set_approval(vendor.id, false).await.unwrap();

    let parent = fixtures::parent(services).await;
    assert_matches!(book(&app, parent, event.id).await, Err(WaddleError::BadRequest(_)));

    let filter = EventFilter {
        vendor_id: Some(vendor.id),
        ..Default::default()
    };
    let listed = services
        .event_service
        .list_public(filter.clone(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 0);

    // banned providers are hidden even once approved
    services.db.vendors.set_approval(vendor.id, true).await.unwrap();
    services.db.vendors.set_ban_status(vendor.id, true).await.unwrap();
    let listed = services
        .event_service
        .list_public(filter.clone(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 0);

    services.db.vendors.set_ban_status(vendor.id, false).await.unwrap();
    let listed = services
        .event_service
        .list_public(filter, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(book(&app, parent, event.id).await.unwrap(), BookingStatus::Confirmed);
}

#[tokio::test]
#[serial]
async fn test_oversized_upload_is_rejected() {
    let Some(db) = TestDatabase::start().await else { return };
    let app = TestApp::build(&db.database_url, "http://127.0.0.1:1", |settings| {
        settings.server.body_limit_bytes = 64 * 1024;
    });
    run_migrations(app.pool()).await.unwrap();
    let parent = fixtures::parent(&app.services).await;
    let token = app.token_for(parent);

    let boundary = "waddle-upload-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"big.png\"\r\n\
         Content-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend(std::iter::repeat(0u8).take(128 * 1024));
    body.extend(format!("\r\n--{boundary}--\r\n").into_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads/images")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, response) = app.send(request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response["code"], "PAYLOAD_TOO_LARGE");
}
