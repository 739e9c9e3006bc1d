//! Event service implementation
//!
//! Listing, ownership checks, the draft/published/cancelled lifecycle,
//! moderation and generation of recurring occurrences.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::repositories::EventRepository;
use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{
    Actor, CreateEventRequest, Event, EventDetails, EventFilter, EventOwner, EventStatus,
    ModerateEventRequest, ModerationStatus, NewNotification, Role, UpdateEventRequest, Validate,
};
use crate::services::booking::BookingService;
use crate::services::notification::NotificationService;
use crate::services::recurrence::Schedule;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct EventService {
    db: DatabaseService,
    bookings: BookingService,
    notifications: NotificationService,
    settings: Settings,
}

impl EventService {
    pub fn new(
        db: DatabaseService,
        bookings: BookingService,
        notifications: NotificationService,
        settings: Settings,
    ) -> Self {
        Self {
            db,
            bookings,
            notifications,
            settings,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("event", id))
    }

    /// Load an event the caller owns
    async fn load_owned(&self, actor: Actor, id: Uuid) -> Result<Event> {
        let event = self.load(id).await?;
        if !event.is_owned_by(&actor) {
            return Err(WaddleError::PermissionDenied("you do not own this event".to_string()));
        }
        Ok(event)
    }

    /// Load an event the caller owns or, for admins, any event
    async fn load_managed(&self, actor: Actor, id: Uuid) -> Result<Event> {
        let event = self.load(id).await?;
        if !actor.is_admin() && !event.is_owned_by(&actor) {
            return Err(WaddleError::PermissionDenied("you do not own this event".to_string()));
        }
        Ok(event)
    }

    /// Banned providers, and unapproved ones while approval is required, cannot list events
    async fn ensure_provider_active(&self, owner: EventOwner) -> Result<()> {
        let standing = match owner {
            EventOwner::Vendor(id) => self
                .db
                .vendors
                .find_by_id(id)
                .await?
                .map(|v| (v.is_approved, v.is_banned)),
            EventOwner::Organiser(id) => self
                .db
                .organisers
                .find_by_id(id)
                .await?
                .map(|o| (o.is_approved, o.is_banned)),
        };
        let (approved, banned) =
            standing.ok_or_else(|| WaddleError::not_found(owner.role().as_str(), owner.id()))?;

        if banned {
            return Err(WaddleError::PermissionDenied("this account is banned".to_string()));
        }
        if !approved && self.settings.features.require_provider_approval {
            return Err(WaddleError::PermissionDenied(
                "this account is awaiting approval".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(&self, actor: Actor, request: CreateEventRequest) -> Result<Event> {
        let owner = EventOwner::from_actor(&actor).ok_or_else(|| {
            WaddleError::PermissionDenied("only vendors and organisers can create events".to_string())
        })?;
        request.validate()?;
        self.ensure_provider_active(owner).await?;

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.settings.stripe.currency.clone());
        let moderation = if self.settings.features.require_event_approval {
            ModerationStatus::Pending
        } else {
            ModerationStatus::Approved
        };

        let event = self.db.events.create(owner, request, &currency, moderation).await?;
        info!(event_id = %event.id, owner = %owner.id(), "Event created");
        Ok(event)
    }

    pub async fn list_public(&self, filter: EventFilter, page: Pagination) -> Result<Paginated<Event>> {
        let (items, total) = self
            .db
            .events
            .list_public(
                &filter,
                page,
                Utc::now(),
                self.settings.features.require_provider_approval,
            )
            .await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_mine(&self, actor: Actor, page: Pagination) -> Result<Paginated<Event>> {
        let owner = EventOwner::from_actor(&actor).ok_or_else(|| {
            WaddleError::PermissionDenied("only vendors and organisers own events".to_string())
        })?;
        let (items, total) = self.db.events.list_by_owner(owner, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Public events for everyone; owners and admins see any of theirs
    pub async fn get(&self, actor: Option<Actor>, id: Uuid) -> Result<EventDetails> {
        let event = self.load(id).await?;
        let privileged = actor
            .map(|a| a.is_admin() || event.is_owned_by(&a))
            .unwrap_or(false);
        if !event.is_public() && !privileged {
            return Err(WaddleError::not_found("event", id));
        }

        let stats = self.db.events.stats(id).await?;
        Ok(EventDetails {
            event,
            like_count: stats.like_count,
            review_count: stats.review_count,
            average_rating: stats.average_rating,
        })
    }

    pub async fn update(&self, actor: Actor, id: Uuid, request: UpdateEventRequest) -> Result<Event> {
        request.validate()?;
        let event = self.load_owned(actor, id).await?;
        if event.status.is_terminal() {
            return Err(WaddleError::BadRequest(format!(
                "{} events cannot be edited",
                event.status.as_str()
            )));
        }

        let merged = request.apply_to(&event)?;
        let updated = self.db.events.update(&merged).await?;
        debug!(event_id = %id, "Event updated");
        Ok(updated)
    }

    pub async fn publish(&self, actor: Actor, id: Uuid) -> Result<Event> {
        let event = self.load_owned(actor, id).await?;
        if event.starts_at <= Utc::now() {
            return Err(WaddleError::BadRequest("past events cannot be published".to_string()));
        }
        if let Some(owner) = event.owner() {
            self.ensure_provider_active(owner).await?;
        }

        let mut conn = self.db.pool().acquire().await?;
        let published =
            EventRepository::transition(&mut *conn, id, EventStatus::Draft, EventStatus::Published)
                .await?
                .ok_or_else(|| WaddleError::InvalidStateTransition {
                    from: event.status.as_str().to_string(),
                    to: EventStatus::Published.as_str().to_string(),
                })?;

        info!(event_id = %id, "Event published");
        Ok(published)
    }

    /// Cancel an event, voiding every active booking
    ///
    /// Cancelling a recurring series also cancels its open occurrences.
    pub async fn cancel(&self, actor: Actor, id: Uuid) -> Result<Event> {
        let event = self.load_managed(actor, id).await?;
        if event.status.is_terminal() {
            return Err(WaddleError::InvalidStateTransition {
                from: event.status.as_str().to_string(),
                to: EventStatus::Cancelled.as_str().to_string(),
            });
        }

        let cancelled = self.cancel_one(&event).await?;

        if event.parent_event_id.is_none() {
            for occurrence in self.db.events.open_occurrences(id).await? {
                if let Err(e) = self.cancel_one(&occurrence).await {
                    error!(event_id = %occurrence.id, error = %e, "Failed to cancel occurrence");
                }
            }
        }

        if actor.is_admin() {
            log_admin_action(actor.id, "cancel_event", Some(&id.to_string()), None);
        }
        Ok(cancelled)
    }

    async fn cancel_one(&self, event: &Event) -> Result<Event> {
        let mut conn = self.db.pool().acquire().await?;
        let cancelled = EventRepository::transition(&mut *conn, event.id, event.status, EventStatus::Cancelled)
            .await?
            .ok_or_else(|| WaddleError::Conflict("event changed while cancelling, retry".to_string()))?;
        drop(conn);

        let bookings = self.db.bookings.active_for_event(event.id).await?;
        let mut failed = 0usize;
        for booking in &bookings {
            if let Err(e) = self.bookings.void(booking).await {
                failed += 1;
                error!(booking_id = %booking.id, error = %e, "Failed to void booking of cancelled event");
            }
            self.notifications
                .notify_quietly(
                    NewNotification::new(
                        booking.user_id,
                        Role::User,
                        kinds::EVENT_CANCELLED,
                        "Event cancelled",
                        format!("{} has been cancelled. Any payment will be refunded.", event.title),
                    )
                    .with_data(serde_json::json!({ "event_id": event.id, "booking_id": booking.id })),
                )
                .await;
        }

        if failed > 0 {
            warn!(event_id = %event.id, failed = failed, "Some bookings could not be voided");
        }
        info!(event_id = %event.id, bookings = bookings.len(), "Event cancelled");
        Ok(cancelled)
    }

    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<()> {
        self.load_managed(actor, id).await?;
        if !self.db.events.delete_if_unbooked(id).await? {
            return Err(WaddleError::Conflict(
                "event has active bookings; cancel it instead".to_string(),
            ));
        }
        if actor.is_admin() {
            log_admin_action(actor.id, "delete_event", Some(&id.to_string()), None);
        }
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn list_for_moderation(
        &self,
        status: Option<ModerationStatus>,
        page: Pagination,
    ) -> Result<Paginated<Event>> {
        let (items, total) = self.db.events.list_by_moderation(status, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn moderate(&self, admin: Actor, id: Uuid, request: ModerateEventRequest) -> Result<Event> {
        request.validate()?;
        let event = self
            .db
            .events
            .moderate(id, request.status, request.note.as_deref())
            .await?;

        log_admin_action(
            admin.id,
            "moderate_event",
            Some(&id.to_string()),
            Some(match request.status {
                ModerationStatus::Approved => "approved",
                ModerationStatus::Rejected => "rejected",
                ModerationStatus::Pending => "pending",
            }),
        );

        if let Some(owner) = event.owner() {
            let body = match request.status {
                ModerationStatus::Approved => format!("{} was approved.", event.title),
                _ => format!(
                    "{} was rejected{}",
                    event.title,
                    request
                        .note
                        .as_deref()
                        .map(|n| format!(": {}", n))
                        .unwrap_or_else(|| ".".to_string())
                ),
            };
            self.notifications
                .notify_quietly(
                    NewNotification::new(owner.id(), owner.role(), kinds::EVENT_MODERATED, "Event reviewed", body)
                        .with_data(serde_json::json!({ "event_id": id })),
                )
                .await;
        }
        Ok(event)
    }

    /// Insert upcoming occurrences of every recurring series
    pub async fn generate_occurrences(&self, now: DateTime<Utc>) -> Result<u64> {
        let horizon = now + Duration::days(self.settings.jobs.recurrence_horizon_days);
        let parents = self.db.events.recurring_parents(now).await?;
        let mut created = 0;

        for parent in &parents {
            let Some(schedule) = Schedule::from_event(parent) else {
                continue;
            };
            for occurrence in schedule.occurrences_between(now, horizon) {
                if self
                    .db
                    .events
                    .insert_occurrence(parent, occurrence.starts_at, occurrence.ends_at)
                    .await?
                {
                    created += 1;
                }
            }
        }

        debug!(parents = parents.len(), created = created, "Recurring occurrences generated");
        Ok(created)
    }

    /// Mark published events that have ended as completed
    pub async fn complete_finished(&self, now: DateTime<Utc>) -> Result<u64> {
        self.db.events.complete_finished(now).await
    }
}
