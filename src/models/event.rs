//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Actor, Role, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{optional_text, require_text, validate_age_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    /// Cancelled and completed events can no longer be edited
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub capacity: i32,
    pub tickets_booked: i32,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: EventStatus,
    pub moderation_status: ModerationStatus,
    pub moderation_note: Option<String>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub parent_event_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub organiser_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn owner(&self) -> Option<EventOwner> {
        match (self.vendor_id, self.organiser_id) {
            (Some(id), _) => Some(EventOwner::Vendor(id)),
            (None, Some(id)) => Some(EventOwner::Organiser(id)),
            (None, None) => None,
        }
    }

    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        self.owner()
            .map(|owner| owner.matches(actor))
            .unwrap_or(false)
    }

    /// Visible in the public catalogue
    pub fn is_public(&self) -> bool {
        matches!(self.status, EventStatus::Published | EventStatus::Completed)
            && self.moderation_status == ModerationStatus::Approved
    }

    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    pub fn seats_left(&self) -> i32 {
        (self.capacity - self.tickets_booked).max(0)
    }
}

/// The provider account that owns an event, activity or payout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOwner {
    Vendor(Uuid),
    Organiser(Uuid),
}

impl EventOwner {
    /// Owner for a provider caller, `None` for any other role
    pub fn from_actor(actor: &Actor) -> Option<Self> {
        match actor.role {
            Role::Vendor => Some(EventOwner::Vendor(actor.id)),
            Role::Organiser => Some(EventOwner::Organiser(actor.id)),
            _ => None,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            EventOwner::Vendor(id) | EventOwner::Organiser(id) => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            EventOwner::Vendor(_) => Role::Vendor,
            EventOwner::Organiser(_) => Role::Organiser,
        }
    }

    pub fn vendor_id(&self) -> Option<Uuid> {
        match self {
            EventOwner::Vendor(id) => Some(*id),
            EventOwner::Organiser(_) => None,
        }
    }

    pub fn organiser_id(&self) -> Option<Uuid> {
        match self {
            EventOwner::Organiser(id) => Some(*id),
            EventOwner::Vendor(_) => None,
        }
    }

    pub fn matches(&self, actor: &Actor) -> bool {
        self.role() == actor.role && self.id() == actor.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub currency: Option<String>,
    pub capacity: i32,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub recurrence_until: Option<DateTime<Utc>>,
}

impl Validate for CreateEventRequest {
    fn validate(&self) -> Result<()> {
        require_text("title", &self.title, 200)?;
        require_text("category", &self.category, 100)?;
        optional_text("description", self.description.as_deref(), 10_000)?;
        optional_text("venue_name", self.venue_name.as_deref(), 200)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("city", self.city.as_deref(), 100)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)?;
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        validate_listing_numbers(self.price_cents, self.capacity)?;
        validate_age_range(self.min_age, self.max_age)?;
        validate_times(self.starts_at, self.ends_at)?;
        if self.starts_at <= Utc::now() {
            return Err(WaddleError::Validation("starts_at must be in the future".to_string()));
        }
        validate_recurrence(self.recurrence, self.starts_at, self.recurrence_until)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub capacity: Option<i32>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_until: Option<DateTime<Utc>>,
}

impl Validate for UpdateEventRequest {
    fn validate(&self) -> Result<()> {
        optional_text("title", self.title.as_deref(), 200)?;
        optional_text("category", self.category.as_deref(), 100)?;
        optional_text("description", self.description.as_deref(), 10_000)?;
        optional_text("venue_name", self.venue_name.as_deref(), 200)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("city", self.city.as_deref(), 100)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)?;
        validate_listing_numbers(self.price_cents.unwrap_or(0), self.capacity.unwrap_or(1))
    }
}

impl UpdateEventRequest {
    /// Apply the patch to a copy of the event and validate the merged result
    pub fn apply_to(&self, event: &Event) -> Result<Event> {
        let mut merged = event.clone();
        if let Some(v) = &self.title {
            merged.title = v.trim().to_string();
        }
        if let Some(v) = &self.description {
            merged.description = Some(v.clone());
        }
        if let Some(v) = &self.category {
            merged.category = v.trim().to_string();
        }
        if let Some(v) = &self.venue_name {
            merged.venue_name = Some(v.clone());
        }
        if let Some(v) = &self.address {
            merged.address = Some(v.clone());
        }
        if let Some(v) = &self.city {
            merged.city = Some(v.clone());
        }
        if let Some(v) = &self.image_url {
            merged.image_url = Some(v.clone());
        }
        if let Some(v) = self.price_cents {
            merged.price_cents = v;
        }
        if let Some(v) = self.capacity {
            merged.capacity = v;
        }
        if self.min_age.is_some() {
            merged.min_age = self.min_age;
        }
        if self.max_age.is_some() {
            merged.max_age = self.max_age;
        }
        if let Some(v) = self.starts_at {
            merged.starts_at = v;
        }
        if let Some(v) = self.ends_at {
            merged.ends_at = v;
        }
        if let Some(v) = self.recurrence {
            merged.recurrence = v;
        }
        if self.recurrence_until.is_some() {
            merged.recurrence_until = self.recurrence_until;
        }

        validate_age_range(merged.min_age, merged.max_age)?;
        validate_times(merged.starts_at, merged.ends_at)?;
        if self.starts_at.is_some() && merged.starts_at <= Utc::now() {
            return Err(WaddleError::Validation("starts_at must be in the future".to_string()));
        }
        if merged.parent_event_id.is_some() && merged.recurrence != Recurrence::None {
            return Err(WaddleError::Validation(
                "a generated occurrence cannot itself recur".to_string(),
            ));
        }
        validate_recurrence(merged.recurrence, merged.starts_at, merged.recurrence_until)?;
        if merged.capacity < merged.tickets_booked {
            return Err(WaddleError::Validation(format!(
                "capacity cannot be lower than the {} tickets already booked",
                merged.tickets_booked
            )));
        }
        Ok(merged)
    }
}

/// Query parameters of the public listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub vendor_id: Option<Uuid>,
    pub organiser_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationFilter {
    pub moderation_status: Option<ModerationStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerateEventRequest {
    pub status: ModerationStatus,
    pub note: Option<String>,
}

impl Validate for ModerateEventRequest {
    fn validate(&self) -> Result<()> {
        if self.status == ModerationStatus::Pending {
            return Err(WaddleError::Validation(
                "status must be approved or rejected".to_string(),
            ));
        }
        optional_text("note", self.note.as_deref(), 2000)
    }
}

/// Event plus engagement counters
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub like_count: i64,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

fn validate_currency(currency: &str) -> Result<()> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(WaddleError::Validation("currency must be a 3-letter ISO code".to_string()))
    }
}

fn validate_listing_numbers(price_cents: i64, capacity: i32) -> Result<()> {
    if price_cents < 0 {
        return Err(WaddleError::Validation("price_cents cannot be negative".to_string()));
    }
    if capacity < 1 {
        return Err(WaddleError::Validation("capacity must be at least 1".to_string()));
    }
    Ok(())
}

fn validate_times(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<()> {
    if ends_at <= starts_at {
        return Err(WaddleError::Validation("ends_at must be after starts_at".to_string()));
    }
    Ok(())
}

fn validate_recurrence(
    recurrence: Recurrence,
    starts_at: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> Result<()> {
    match (recurrence, until) {
        (Recurrence::None, _) => Ok(()),
        (_, None) => Err(WaddleError::Validation(
            "recurrence_until is required for recurring events".to_string(),
        )),
        (_, Some(until)) if until <= starts_at => Err(WaddleError::Validation(
            "recurrence_until must be after starts_at".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> CreateEventRequest {
        let starts_at = Utc::now() + Duration::days(3);
        CreateEventRequest {
            title: "Toddler Swim".into(),
            description: None,
            category: "swimming".into(),
            venue_name: None,
            address: None,
            city: Some("Leeds".into()),
            image_url: None,
            price_cents: 1200,
            currency: None,
            capacity: 10,
            min_age: Some(1),
            max_age: Some(4),
            starts_at,
            ends_at: starts_at + Duration::hours(1),
            recurrence: Recurrence::None,
            recurrence_until: None,
        }
    }

    pub(crate) fn event_from(req: &CreateEventRequest) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: req.title.clone(),
            description: None,
            category: req.category.clone(),
            venue_name: None,
            address: None,
            city: req.city.clone(),
            image_url: None,
            price_cents: req.price_cents,
            currency: "gbp".into(),
            capacity: req.capacity,
            tickets_booked: 4,
            min_age: req.min_age,
            max_age: req.max_age,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            status: EventStatus::Published,
            moderation_status: ModerationStatus::Approved,
            moderation_note: None,
            recurrence: Recurrence::None,
            recurrence_until: None,
            parent_event_id: None,
            vendor_id: Some(Uuid::new_v4()),
            organiser_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_validation() {
        assert!(request().validate().is_ok());

        let mut req = request();
        req.ends_at = req.starts_at;
        assert!(req.validate().is_err());

        let mut req = request();
        req.starts_at = Utc::now() - Duration::hours(1);
        req.ends_at = Utc::now() + Duration::hours(1);
        assert!(req.validate().is_err());

        let mut req = request();
        req.capacity = 0;
        assert!(req.validate().is_err());

        let mut req = request();
        req.price_cents = -1;
        assert!(req.validate().is_err());

        let mut req = request();
        req.currency = Some("pounds".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_recurrence_requires_until() {
        let mut req = request();
        req.recurrence = Recurrence::Weekly;
        assert!(req.validate().is_err());

        req.recurrence_until = Some(req.starts_at - Duration::days(1));
        assert!(req.validate().is_err());

        req.recurrence_until = Some(req.starts_at + Duration::days(60));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_cannot_drop_capacity_below_booked() {
        let event = event_from(&request());
        let patch = UpdateEventRequest {
            capacity: Some(3),
            ..Default::default()
        };
        assert!(patch.apply_to(&event).is_err());

        let patch = UpdateEventRequest {
            capacity: Some(4),
            title: Some("  Baby Swim ".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&event).unwrap();
        assert_eq!(merged.capacity, 4);
        assert_eq!(merged.title, "Baby Swim");
    }

    #[test]
    fn test_ownership() {
        let event = event_from(&request());
        let owner = Actor::new(event.vendor_id.unwrap(), Role::Vendor);
        let other_role = Actor::new(event.vendor_id.unwrap(), Role::Organiser);
        assert!(event.is_owned_by(&owner));
        assert!(!event.is_owned_by(&other_role));
        assert_eq!(event.seats_left(), 6);
        assert!(event.is_public());
    }

    #[test]
    fn test_moderation_request_rejects_pending() {
        let req = ModerateEventRequest {
            status: ModerationStatus::Pending,
            note: None,
        };
        assert!(req.validate().is_err());
    }
}
