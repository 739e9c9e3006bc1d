//! Stripe reconciliation, refunds, disputes and payouts against PostgreSQL
//!
//! Each test skips itself when no database can be started.

mod fixtures;
mod helpers;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{
    mock_checkout_sessions, mock_refunds, mock_session_expiry, session_object, webhook_event, TestApp,
    TestDatabase,
};
use waddle::models::{
    Actor, Booking, BookingStatus, CreateBookingRequest, CreateDisputeRequest, CreatePayoutRequest,
    DisputeStatus, Event, PaymentStatus, PayoutStatus, ProcessPayoutRequest, UpdateDisputeStatusRequest,
};
use waddle::utils::{Pagination, WaddleError};

/// Book `quantity` seats, leaving the booking pending on its checkout session
async fn pending_booking(app: &TestApp, parent: Actor, event: &Event, quantity: i32) -> Booking {
    let checkout = app
        .services
        .booking_service
        .create(
            parent,
            CreateBookingRequest {
                event_id: event.id,
                quantity,
            },
        )
        .await
        .unwrap();
    assert_eq!(checkout.booking.status, BookingStatus::Pending);
    assert!(checkout.booking.stripe_session_id.is_some());
    checkout.booking
}

/// Pay a pending booking through the completed-session webhook, returning its payment intent
async fn pay(app: &TestApp, booking: &Booking) -> String {
    let intent = format!("pi_{}", Uuid::new_v4().simple());
    let session_id = booking.stripe_session_id.as_deref().unwrap();
    let payload = webhook_event(
        "checkout.session.completed",
        session_object(session_id, booking.id, "paid", Some(&intent)),
    );

    let (status, body) = app.deliver_webhook(&payload).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["outcome"].as_str().unwrap().starts_with("Confirmed"));
    intent
}

async fn seats_taken(app: &TestApp, event_id: Uuid) -> i32 {
    app.services
        .db
        .events
        .find_by_id(event_id)
        .await
        .unwrap()
        .unwrap()
        .tickets_booked
}

async fn payment_status(app: &TestApp, parent: Actor) -> PaymentStatus {
    let payments = app
        .services
        .payment_service
        .list_mine(parent, Pagination::default())
        .await
        .unwrap();
    assert_eq!(payments.items.len(), 1);
    payments.items[0].status
}

#[tokio::test]
#[serial]
async fn test_expired_session_releases_seats() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let event = fixtures::bookable_event(&app.services, 1200, 4).await;
    let parent = fixtures::parent(&app.services).await;

    let booking = pending_booking(&app, parent, &event, 3).await;
    assert_eq!(seats_taken(&app, event.id).await, 3);

    let payload = webhook_event(
        "checkout.session.expired",
        session_object(booking.stripe_session_id.as_deref().unwrap(), booking.id, "unpaid", None),
    );
    let (status, body) = app.deliver_webhook(&payload).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["outcome"].as_str().unwrap().starts_with("Closed"));

    let booking = app.services.booking_service.get(parent, booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Expired);
    assert_eq!(seats_taken(&app, event.id).await, 0);
    assert_eq!(payment_status(&app, parent).await, PaymentStatus::Failed);
}

#[tokio::test]
#[serial]
async fn test_failed_async_payment_cancels_booking() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let event = fixtures::bookable_event(&app.services, 800, 2).await;
    let parent = fixtures::parent(&app.services).await;

    let booking = pending_booking(&app, parent, &event, 2).await;

    let payload = webhook_event(
        "checkout.session.async_payment_failed",
        session_object(booking.stripe_session_id.as_deref().unwrap(), booking.id, "unpaid", None),
    );
    let (status, _) = app.deliver_webhook(&payload).await;
    assert_eq!(status, StatusCode::OK);

    let booking = app.services.booking_service.get(parent, booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(seats_taken(&app, event.id).await, 0);

    // the seats can be sold again
    let other = fixtures::parent(&app.services).await;
    pending_booking(&app, other, &event, 2).await;
}

#[tokio::test]
#[serial]
async fn test_full_charge_refund_refunds_booking() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let event = fixtures::bookable_event(&app.services, 1000, 5).await;
    let parent = fixtures::parent(&app.services).await;

    let booking = pending_booking(&app, parent, &event, 1).await;
    let intent = pay(&app, &booking).await;

    let partial = webhook_event(
        "charge.refunded",
        json!({ "id": "ch_partial", "payment_intent": intent, "refunded": false }),
    );
    let (status, body) = app.deliver_webhook(&partial).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Ignored");
    let current = app.services.booking_service.get(parent, booking.id).await.unwrap();
    assert_eq!(current.status, BookingStatus::Confirmed);
    assert_eq!(seats_taken(&app, event.id).await, 1);

    let full = webhook_event(
        "charge.refunded",
        json!({ "id": "ch_full", "payment_intent": intent, "refunded": true }),
    );
    let (status, body) = app.deliver_webhook(&full).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["outcome"].as_str().unwrap().starts_with("Refunded"));

    let current = app.services.booking_service.get(parent, booking.id).await.unwrap();
    assert_eq!(current.status, BookingStatus::Refunded);
    assert_eq!(seats_taken(&app, event.id).await, 0);
    assert_eq!(payment_status(&app, parent).await, PaymentStatus::Refunded);
}

#[tokio::test]
#[serial]
async fn test_late_payment_without_intent_is_acknowledged() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let event = fixtures::bookable_event(&app.services, 1000, 5).await;
    let parent = fixtures::parent(&app.services).await;

    let booking = pending_booking(&app, parent, &event, 1).await;
    let later = Utc::now() + Duration::minutes(app.settings.stripe.checkout_expiry_minutes + 5);
    app.services.booking_service.expire_stale(later).await.unwrap();

    let payload = webhook_event(
        "checkout.session.completed",
        session_object(booking.stripe_session_id.as_deref().unwrap(), booking.id, "paid", None),
    );
    let (status, body) = app.deliver_webhook(&payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Ignored");

    // recorded, so a redelivery is a duplicate rather than another attempt
    let (status, body) = app.deliver_webhook(&payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Duplicate");
}

#[tokio::test]
#[serial]
async fn test_cancellation_window() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let services = &app.services;

    // a free event starting inside the window
    let vendor = fixtures::vendor(services).await;
    let mut soon = fixtures::event_request(0, 5);
    soon.starts_at = Utc::now() + Duration::hours(12);
    soon.ends_at = soon.starts_at + Duration::hours(1);
    let soon = fixtures::list_event(services, vendor, soon).await;

    let parent = fixtures::parent(services).await;
    let checkout = services
        .booking_service
        .create(
            parent,
            CreateBookingRequest {
                event_id: soon.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    let result = services.booking_service.cancel(parent, checkout.booking.id).await;
    assert_matches!(result, Err(WaddleError::BadRequest(_)));

    // a paid event two weeks out is refunded
    let event = fixtures::bookable_event(services, 2500, 5).await;
    let booking = pending_booking(&app, parent, &event, 2).await;
    pay(&app, &booking).await;

    Mock::given(method("POST"))
        .and(path("/v1/refunds"))
        .and(header("Idempotency-Key", format!("refund-{}", booking.id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "re_cancel",
            "status": "succeeded",
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let refunded = services.booking_service.cancel(parent, booking.id).await.unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(seats_taken(&app, event.id).await, 0);
}

#[tokio::test]
#[serial]
async fn test_cancelling_event_voids_its_bookings() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    mock_session_expiry(&stripe).await;
    mock_refunds(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let services = &app.services;

    let vendor = fixtures::vendor(services).await;
    let event = fixtures::list_event(services, vendor, fixtures::event_request(1500, 6)).await;

    let paying = fixtures::parent(services).await;
    let paid = pending_booking(&app, paying, &event, 2).await;
    pay(&app, &paid).await;
    let waiting = fixtures::parent(services).await;
    let pending = pending_booking(&app, waiting, &event, 1).await;
    assert_eq!(seats_taken(&app, event.id).await, 3);

    let cancelled = services.event_service.cancel(vendor, event.id).await.unwrap();
    assert_eq!(cancelled.status, waddle::models::EventStatus::Cancelled);

    let paid = services.booking_service.get(paying, paid.id).await.unwrap();
    assert_eq!(paid.status, BookingStatus::Refunded);
    let pending = services.booking_service.get(waiting, pending.id).await.unwrap();
    assert_eq!(pending.status, BookingStatus::Cancelled);
    assert_eq!(seats_taken(&app, event.id).await, 0);

    // a cancelled event cannot be cancelled again
    let again = services.event_service.cancel(vendor, event.id).await;
    assert_matches!(again, Err(WaddleError::InvalidStateTransition { .. }));
}

#[tokio::test]
#[serial]
async fn test_dispute_lifecycle() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    mock_refunds(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let services = &app.services;
    let admin = fixtures::admin(services).await;
    let event = fixtures::bookable_event(services, 2000, 5).await;
    let parent = fixtures::parent(services).await;

    let booking = pending_booking(&app, parent, &event, 1).await;
    pay(&app, &booking).await;

    let request = || CreateDisputeRequest {
        booking_id: booking.id,
        reason: "Session did not run".to_string(),
        description: "The pool was closed when we arrived".to_string(),
    };
    let dispute = services.dispute_service.create(parent, request()).await.unwrap();
    assert_eq!(dispute.status, DisputeStatus::Pending);

    let second = services.dispute_service.create(parent, request()).await;
    assert_matches!(second, Err(WaddleError::Conflict(_)));

    let stranger = fixtures::parent(services).await;
    let result = services.dispute_service.get(stranger, dispute.id).await;
    assert_matches!(result, Err(WaddleError::PermissionDenied(_)));

    let resolve = |refund| UpdateDisputeStatusRequest {
        status: DisputeStatus::Resolved,
        resolution_note: Some("Refunded in full".to_string()),
        refund,
    };
    let skipped = services
        .dispute_service
        .update_status(admin, dispute.id, resolve(false))
        .await;
    assert_matches!(skipped, Err(WaddleError::InvalidStateTransition { .. }));

    let in_review = services
        .dispute_service
        .update_status(
            admin,
            dispute.id,
            UpdateDisputeStatusRequest {
                status: DisputeStatus::InReview,
                resolution_note: None,
                refund: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(in_review.status, DisputeStatus::InReview);

    let resolved = services
        .dispute_service
        .update_status(admin, dispute.id, resolve(true))
        .await
        .unwrap();
    assert_eq!(resolved.status, DisputeStatus::Resolved);
    assert!(resolved.refund_issued);
    assert_eq!(resolved.resolved_by, Some(admin.id));

    let booking = services.booking_service.get(parent, booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Refunded);
}

#[tokio::test]
#[serial]
async fn test_payouts_are_bounded_by_earnings() {
    let Some(db) = TestDatabase::start().await else { return };
    let stripe = MockServer::start().await;
    mock_checkout_sessions(&stripe).await;
    let app = TestApp::with_database(&db, &stripe.uri()).await;
    let services = &app.services;
    let admin = fixtures::admin(services).await;
    let vendor = fixtures::vendor(services).await;
    let event = fixtures::list_event(services, vendor, fixtures::event_request(1500, 5)).await;
    let parent = fixtures::parent(services).await;

    let booking = pending_booking(&app, parent, &event, 2).await;
    pay(&app, &booking).await;

    let earnings = services.payment_service.earnings(vendor).await.unwrap();
    assert_eq!(earnings.gross_cents, 3000);
    assert_eq!(earnings.platform_fee_cents, 300);
    assert_eq!(earnings.available_cents, 2700);

    let payout = |amount_cents| CreatePayoutRequest {
        amount_cents,
        note: None,
    };
    let too_much = services.payment_service.request_payout(vendor, payout(5000)).await;
    assert_matches!(too_much, Err(WaddleError::BadRequest(_)));

    let requested = services
        .payment_service
        .request_payout(vendor, payout(2000))
        .await
        .unwrap();
    assert_eq!(requested.status, PayoutStatus::Pending);

    // the pending payout is reserved against the balance
    let earnings = services.payment_service.earnings(vendor).await.unwrap();
    assert_eq!(earnings.pending_payout_cents, 2000);
    assert_eq!(earnings.available_cents, 700);
    let over = services.payment_service.request_payout(vendor, payout(800)).await;
    assert_matches!(over, Err(WaddleError::BadRequest(_)));

    let paid = services
        .payment_service
        .process_payout(
            admin,
            requested.id,
            ProcessPayoutRequest {
                status: PayoutStatus::Paid,
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, PayoutStatus::Paid);

    let again = services
        .payment_service
        .process_payout(
            admin,
            requested.id,
            ProcessPayoutRequest {
                status: PayoutStatus::Rejected,
                note: None,
            },
        )
        .await;
    assert_matches!(again, Err(WaddleError::InvalidStateTransition { .. }));

    let earnings = services.payment_service.earnings(vendor).await.unwrap();
    assert_eq!(earnings.paid_out_cents, 2000);
    assert_eq!(earnings.pending_payout_cents, 0);
    assert_eq!(earnings.available_cents, 700);
}
