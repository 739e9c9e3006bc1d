//! Test data builders

#![allow(dead_code)]

use chrono::{Duration, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use serde_json::{json, Value};
use uuid::Uuid;

use waddle::models::{
    Actor, CreateEventRequest, Event, EventStatus, ModerateEventRequest, ModerationStatus, Recurrence,
    Role,
};
use waddle::services::ServiceFactory;

pub const PASSWORD: &str = "correct horse battery";

/// Email that never collides with earlier runs against the same database
pub fn unique_email() -> String {
    let email: String = SafeEmail().fake();
    format!("{}.{}", Uuid::new_v4().simple(), email)
}

pub fn user_signup(email: &str) -> Value {
    json!({
        "role": "user",
        "email": email,
        "password": PASSWORD,
        "first_name": FirstName().fake::<String>(),
        "last_name": LastName().fake::<String>(),
    })
}

pub fn vendor_signup(email: &str) -> Value {
    json!({
        "role": "vendor",
        "email": email,
        "password": PASSWORD,
        "business_name": CompanyName().fake::<String>(),
    })
}

pub fn event_request(price_cents: i64, capacity: i32) -> CreateEventRequest {
    let starts_at = Utc::now() + Duration::days(14);
    CreateEventRequest {
        title: "Toddler Splash Session".to_string(),
        description: Some("Warm pool, small groups".to_string()),
        category: "swimming".to_string(),
        venue_name: Some("Leisure Centre".to_string()),
        address: None,
        city: Some("Leeds".to_string()),
        image_url: None,
        price_cents,
        currency: None,
        capacity,
        min_age: Some(1),
        max_age: Some(4),
        starts_at,
        ends_at: starts_at + Duration::hours(1),
        recurrence: Recurrence::None,
        recurrence_until: None,
    }
}

/// An admin account inserted directly
pub async fn admin(services: &ServiceFactory) -> Actor {
    let admin = services
        .db
        .admins
        .create(&unique_email(), "not-a-real-hash", "Test Admin")
        .await
        .expect("admin");
    Actor::new(admin.id, Role::Admin)
}

/// A parent account created through signup
pub async fn parent(services: &ServiceFactory) -> Actor {
    let request = serde_json::from_value(user_signup(&unique_email())).expect("signup request");
    let response = services.auth_service.signup(request).await.expect("user signup");
    let id = response.account["id"].as_str().expect("account id").parse().expect("uuid");
    Actor::new(id, Role::User)
}

/// A vendor account created through signup, still awaiting approval
pub async fn unapproved_vendor(services: &ServiceFactory) -> Actor {
    let request = serde_json::from_value(vendor_signup(&unique_email())).expect("signup request");
    let response = services.auth_service.signup(request).await.expect("vendor signup");
    let id = response.account["id"].as_str().expect("account id").parse().expect("uuid");
    Actor::new(id, Role::Vendor)
}

/// An approved vendor
pub async fn vendor(services: &ServiceFactory) -> Actor {
    let vendor = unapproved_vendor(services).await;
    services
        .db
        .vendors
        .set_approval(vendor.id, true)
        .await
        .expect("approve vendor");
    vendor
}

/// Publish and approve an event of `vendor`
pub async fn list_event(services: &ServiceFactory, vendor: Actor, request: CreateEventRequest) -> Event {
    let admin = admin(services).await;
    let event = services.event_service.create(vendor, request).await.expect("create event");
    assert_eq!(event.status, EventStatus::Draft);
    assert_eq!(event.moderation_status, ModerationStatus::Pending);

    services.event_service.publish(vendor, event.id).await.expect("publish event");
    services
        .event_service
        .moderate(
            admin,
            event.id,
            ModerateEventRequest {
                status: ModerationStatus::Approved,
                note: None,
            },
        )
        .await
        .expect("approve event")
}

/// Published and approved event owned by a fresh vendor
pub async fn bookable_event(services: &ServiceFactory, price_cents: i64, capacity: i32) -> Event {
    let vendor = vendor(services).await;
    list_event(services, vendor, event_request(price_cents, capacity)).await
}
