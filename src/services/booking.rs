//! Booking service implementation
//!
//! Seats are reserved with one conditional update inside the transaction that
//! inserts the booking, so an event can never be oversold. Paid bookings stay
//! `pending` until the Stripe webhook confirms them.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::repositories::{BookingRepository, EventRepository, NewBooking, PaymentRepository};
use crate::database::DatabaseService;
use crate::models::booking::{booking_total, platform_fee};
use crate::models::notification::kinds;
use crate::models::{
    Actor, Booking, BookingCheckout, BookingFilter, BookingStatus, CreateBookingRequest, Event,
    NewNotification, PaymentStatus, Role, Validate,
};
use crate::services::mail::{booking_confirmed_email, SharedMailer};
use crate::services::notification::NotificationService;
use crate::services::stripe::{CheckoutRequest, StripeClient};
use crate::utils::errors::{Result, StripeError, WaddleError};
use crate::utils::helpers::{format_amount, Paginated, Pagination};
use crate::utils::logging::{log_booking_event, log_payment_event};

/// Seconds added to a checkout session's lifetime to cover request latency
const SESSION_EXPIRY_MARGIN_SECS: i64 = 120;

/// When a checkout session opened at `now` should expire
///
/// Stripe accepts 30 minutes to 24 hours after the session is created, so
/// the configured lifetime gets a margin and is capped below a day.
pub fn checkout_session_expiry(now: DateTime<Utc>, expiry_minutes: i64) -> DateTime<Utc> {
    let margin = Duration::seconds(SESSION_EXPIRY_MARGIN_SECS);
    let wanted = now + Duration::minutes(expiry_minutes) + margin;
    wanted.min(now + Duration::hours(24) - margin)
}

/// Move a pending booking to `to`, give its seats back and fail its payment
///
/// Returns `None` when the booking was no longer pending.
pub async fn close_pending(
    conn: &mut PgConnection,
    booking_id: Uuid,
    to: BookingStatus,
) -> Result<Option<Booking>> {
    let Some(booking) =
        BookingRepository::transition(&mut *conn, booking_id, BookingStatus::Pending, to, None).await?
    else {
        return Ok(None);
    };
    EventRepository::release_seats(&mut *conn, booking.event_id, booking.quantity).await?;
    PaymentRepository::transition(
        &mut *conn,
        booking.id,
        PaymentStatus::Pending,
        PaymentStatus::Failed,
        None,
    )
    .await?;
    Ok(Some(booking))
}

/// Record a refund of a confirmed booking
///
/// Returns `None` when the booking was no longer confirmed.
pub async fn record_refund(conn: &mut PgConnection, booking_id: Uuid) -> Result<Option<Booking>> {
    let Some(booking) = BookingRepository::transition(
        &mut *conn,
        booking_id,
        BookingStatus::Confirmed,
        BookingStatus::Refunded,
        None,
    )
    .await?
    else {
        return Ok(None);
    };
    EventRepository::release_seats(&mut *conn, booking.event_id, booking.quantity).await?;
    PaymentRepository::transition(
        &mut *conn,
        booking.id,
        PaymentStatus::Succeeded,
        PaymentStatus::Refunded,
        None,
    )
    .await?;
    Ok(Some(booking))
}

#[derive(Clone)]
pub struct BookingService {
    db: DatabaseService,
    stripe: StripeClient,
    notifications: NotificationService,
    mailer: SharedMailer,
    settings: Settings,
}

impl BookingService {
    pub fn new(
        db: DatabaseService,
        stripe: StripeClient,
        notifications: NotificationService,
        mailer: SharedMailer,
        settings: Settings,
    ) -> Self {
        Self {
            db,
            stripe,
            notifications,
            mailer,
            settings,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Booking> {
        self.db
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("booking", id))
    }

    async fn load_event(&self, id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("event", id))
    }

    pub async fn create(&self, actor: Actor, request: CreateBookingRequest) -> Result<BookingCheckout> {
        request.validate()?;
        let max = self.settings.bookings.max_tickets_per_booking;
        if request.quantity > max {
            return Err(WaddleError::Validation(format!(
                "at most {} tickets can be booked at once",
                max
            )));
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let Some(event) =
            EventRepository::reserve_seats(
                &mut *tx,
                request.event_id,
                request.quantity,
                now,
                self.settings.features.require_provider_approval,
            )
            .await?
        else {
            let event = EventRepository::find_for_update(&mut *tx, request.event_id)
                .await?
                .ok_or_else(|| WaddleError::not_found("event", request.event_id))?;
            return Err(Self::unbookable_reason(&event, request.quantity, now));
        };

        let total = booking_total(event.price_cents, request.quantity)
            .ok_or_else(|| WaddleError::Validation("booking total is too large".to_string()))?;
        let free = total == 0;
        let expires_at = (!free)
            .then(|| checkout_session_expiry(now, self.settings.stripe.checkout_expiry_minutes));

        let booking = BookingRepository::insert(
            &mut *tx,
            NewBooking {
                user_id: actor.id,
                event_id: event.id,
                quantity: request.quantity,
                unit_price_cents: event.price_cents,
                total_cents: total,
                currency: event.currency.clone(),
                status: if free {
                    BookingStatus::Confirmed
                } else {
                    BookingStatus::Pending
                },
                expires_at,
            },
        )
        .await?;

        if !free {
            let fee = platform_fee(total, self.settings.stripe.platform_fee_percent);
            PaymentRepository::create(&mut *tx, booking.id, actor.id, total, fee, &event.currency).await?;
        }
        tx.commit().await?;

        if free {
            log_booking_event(booking.id, event.id, "confirmed", Some("free event"));
            self.announce_confirmation(&booking, &event).await;
            return Ok(BookingCheckout {
                booking,
                checkout_url: None,
            });
        }

        log_booking_event(booking.id, event.id, "created", Some("awaiting payment"));
        match self.open_checkout(&booking, &event).await {
            Ok(booking) => Ok(BookingCheckout {
                checkout_url: booking.checkout_url.clone(),
                booking,
            }),
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "Checkout failed, releasing seats");
                let mut tx = self.db.begin().await?;
                close_pending(&mut *tx, booking.id, BookingStatus::Cancelled).await?;
                tx.commit().await?;
                log_booking_event(booking.id, event.id, "cancelled", Some("checkout failed"));
                Err(e)
            }
        }
    }

    fn unbookable_reason(event: &Event, quantity: i32, now: DateTime<Utc>) -> WaddleError {
        // enough seats means the provider is not in good standing
        if !event.is_public() || event.starts_at <= now || event.seats_left() >= quantity {
            WaddleError::BadRequest("event is not open for booking".to_string())
        } else {
            WaddleError::Conflict(format!("only {} seats left", event.seats_left()))
        }
    }

    async fn open_checkout(&self, booking: &Booking, event: &Event) -> Result<Booking> {
        let email = self.db.accounts.email(Role::User, booking.user_id).await?;
        let expires_at = checkout_session_expiry(Utc::now(), self.settings.stripe.checkout_expiry_minutes);
        let session = self
            .stripe
            .create_checkout_session(&CheckoutRequest {
                booking_id: booking.id,
                product_name: &event.title,
                unit_amount_cents: booking.unit_price_cents,
                quantity: booking.quantity,
                currency: &booking.currency,
                customer_email: email.as_deref(),
                expires_at,
            })
            .await?;
        let url = session
            .url
            .as_deref()
            .ok_or_else(|| StripeError::InvalidResponse("checkout session has no url".to_string()))?;

        log_payment_event(&session.id, "checkout_session_created", Some(booking.total_cents), true);
        self.db
            .bookings
            .set_checkout(booking.id, &session.id, url, expires_at)
            .await
    }

    /// In-app notification and email for a confirmed booking
    pub async fn announce_confirmation(&self, booking: &Booking, event: &Event) {
        self.notifications
            .notify_quietly(
                NewNotification::new(
                    booking.user_id,
                    Role::User,
                    kinds::BOOKING_CONFIRMED,
                    "Booking confirmed",
                    format!("Your booking for {} is confirmed.", event.title),
                )
                .with_data(serde_json::json!({ "booking_id": booking.id, "event_id": event.id })),
            )
            .await;

        match self.db.accounts.email(Role::User, booking.user_id).await {
            Ok(Some(email)) => {
                let amount = format_amount(booking.total_cents, &booking.currency);
                if let Err(e) = self
                    .mailer
                    .send(booking_confirmed_email(&email, &event.title, booking.quantity, &amount))
                    .await
                {
                    warn!(booking_id = %booking.id, error = %e, "Failed to send confirmation email");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(booking_id = %booking.id, error = %e, "Failed to load customer email"),
        }
    }

    /// Owner, the event's owner or an admin
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<Booking> {
        let booking = self.load(id).await?;
        if actor.is_admin() || (actor.role == Role::User && booking.user_id == actor.id) {
            return Ok(booking);
        }
        if actor.role.is_provider() && self.load_event(booking.event_id).await?.is_owned_by(&actor) {
            return Ok(booking);
        }
        Err(WaddleError::PermissionDenied("you cannot view this booking".to_string()))
    }

    pub async fn list_mine(&self, actor: Actor, page: Pagination) -> Result<Paginated<Booking>> {
        let (items, total) = self.db.bookings.list_by_user(actor.id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_for_event(&self, actor: Actor, event_id: Uuid, page: Pagination) -> Result<Paginated<Booking>> {
        let event = self.load_event(event_id).await?;
        if !actor.is_admin() && !event.is_owned_by(&actor) {
            return Err(WaddleError::PermissionDenied(
                "only the event owner can list its bookings".to_string(),
            ));
        }
        let (items, total) = self.db.bookings.list_by_event(event_id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_all(&self, filter: BookingFilter, page: Pagination) -> Result<Paginated<Booking>> {
        let (items, total) = self.db.bookings.list(&filter, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Customer cancellation
    pub async fn cancel(&self, actor: Actor, id: Uuid) -> Result<Booking> {
        let booking = self.load(id).await?;
        if booking.user_id != actor.id {
            return Err(WaddleError::PermissionDenied("you cannot cancel this booking".to_string()));
        }

        match booking.status {
            BookingStatus::Pending => self.cancel_pending(&booking).await,
            BookingStatus::Confirmed => {
                let event = self.load_event(booking.event_id).await?;
                let window = Duration::hours(self.settings.bookings.cancellation_window_hours);
                if event.starts_at - Utc::now() <= window {
                    return Err(WaddleError::BadRequest(format!(
                        "bookings can only be cancelled more than {} hours before the event",
                        self.settings.bookings.cancellation_window_hours
                    )));
                }
                self.refund_confirmed(&booking).await
            }
            other => Err(WaddleError::InvalidStateTransition {
                from: other.to_string(),
                to: BookingStatus::Cancelled.to_string(),
            }),
        }
    }

    async fn cancel_pending(&self, booking: &Booking) -> Result<Booking> {
        if let Some(session_id) = booking.stripe_session_id.as_deref() {
            // A session that was paid meanwhile is refunded by the webhook
            if let Err(e) = self.stripe.expire_checkout_session(session_id).await {
                warn!(booking_id = %booking.id, error = %e, "Could not expire checkout session");
            }
        }

        let mut tx = self.db.begin().await?;
        let closed = close_pending(&mut *tx, booking.id, BookingStatus::Cancelled).await?;
        tx.commit().await?;

        match closed {
            Some(closed) => {
                log_booking_event(closed.id, closed.event_id, "cancelled", None);
                Ok(closed)
            }
            None => {
                let current = self.load(booking.id).await?;
                Err(WaddleError::InvalidStateTransition {
                    from: current.status.to_string(),
                    to: BookingStatus::Cancelled.to_string(),
                })
            }
        }
    }

    /// Give the money of a confirmed booking back
    ///
    /// Free bookings are simply cancelled. Paid bookings are refunded through
    /// Stripe first and recorded afterwards; the refund request is idempotent
    /// per booking.
    pub async fn refund_confirmed(&self, booking: &Booking) -> Result<Booking> {
        if booking.total_cents == 0 {
            let mut tx = self.db.begin().await?;
            let cancelled = BookingRepository::transition(
                &mut *tx,
                booking.id,
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
                None,
            )
            .await?;
            if let Some(cancelled) = &cancelled {
                EventRepository::release_seats(&mut *tx, cancelled.event_id, cancelled.quantity).await?;
            }
            tx.commit().await?;
            return match cancelled {
                Some(cancelled) => {
                    log_booking_event(cancelled.id, cancelled.event_id, "cancelled", Some("free booking"));
                    Ok(cancelled)
                }
                None => self.load(booking.id).await,
            };
        }

        let payment_intent = match booking.stripe_payment_intent_id.clone() {
            Some(intent) => intent,
            None => self
                .db
                .payments
                .find_by_booking(booking.id)
                .await?
                .and_then(|p| p.stripe_payment_intent_id)
                .ok_or_else(|| WaddleError::Conflict("booking has no captured payment to refund".to_string()))?,
        };

        let refund = self
            .stripe
            .create_refund(&payment_intent, None, &format!("refund-{}", booking.id))
            .await?;
        log_payment_event(&refund.id, "refund_created", Some(booking.total_cents), true);

        let mut tx = self.db.begin().await?;
        let refunded = record_refund(&mut *tx, booking.id).await?;
        tx.commit().await?;

        match refunded {
            Some(refunded) => {
                log_booking_event(refunded.id, refunded.event_id, "refunded", None);
                self.notifications
                    .notify_quietly(
                        NewNotification::new(
                            refunded.user_id,
                            Role::User,
                            kinds::BOOKING_REFUNDED,
                            "Booking refunded",
                            format!(
                                "{} has been refunded to your original payment method.",
                                format_amount(refunded.total_cents, &refunded.currency)
                            ),
                        )
                        .with_data(serde_json::json!({ "booking_id": refunded.id })),
                    )
                    .await;
                Ok(refunded)
            }
            // already recorded by the charge.refunded webhook
            None => self.load(booking.id).await,
        }
    }

    /// Void a booking of an event that is being cancelled
    pub async fn void(&self, booking: &Booking) -> Result<Booking> {
        match booking.status {
            BookingStatus::Pending => self.cancel_pending(booking).await,
            BookingStatus::Confirmed => self.refund_confirmed(booking).await,
            _ => Ok(booking.clone()),
        }
    }

    /// Expire pending bookings whose checkout window has closed
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut expired = 0;
        loop {
            let batch = self.db.bookings.expired_pending(now, 100).await?;
            if batch.is_empty() {
                break;
            }
            let mut progressed = false;
            for booking in batch {
                let mut tx = self.db.begin().await?;
                let closed = close_pending(&mut *tx, booking.id, BookingStatus::Expired).await?;
                tx.commit().await?;
                if let Some(closed) = closed {
                    progressed = true;
                    expired += 1;
                    log_booking_event(closed.id, closed.event_id, "expired", None);
                }
            }
            if !progressed {
                break;
            }
        }
        if expired > 0 {
            info!(count = expired, "Expired stale pending bookings");
        } else {
            debug!("No stale pending bookings");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_expiry_clears_stripe_minimum() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let expiry = checkout_session_expiry(now, 30);
        assert!(expiry - now > Duration::minutes(30));
        assert_eq!(expiry.timestamp() - now.timestamp(), 30 * 60 + SESSION_EXPIRY_MARGIN_SECS);
    }

    #[test]
    fn test_session_expiry_stays_under_a_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let expiry = checkout_session_expiry(now, 24 * 60);
        assert!(expiry - now < Duration::hours(24));
        assert!(expiry - now > Duration::hours(23));
    }
}
