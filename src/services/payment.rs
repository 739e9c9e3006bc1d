//! Payment service implementation
//!
//! Reconciles Stripe webhook deliveries with bookings and payments, and
//! manages provider earnings and payouts.
//!
//! Each delivery is recorded in the `stripe_events` ledger inside the same
//! transaction as its effects. A redelivery finds the ledger row and is
//! acknowledged without side effects; a failed delivery rolls back the ledger
//! row too, so Stripe's retry is processed again.

use ::stripe::EventType;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::repositories::{
    BookingRepository, PaymentRepository, PayoutRepository, StripeEventRepository,
};
use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{
    Actor, Booking, BookingStatus, CreatePayoutRequest, Earnings, EventOwner, NewNotification,
    Payment, PaymentStatus, Payout, PayoutStatus, ProcessPayoutRequest, Role, Validate,
};
use crate::services::booking::{close_pending, record_refund, BookingService};
use crate::services::notification::NotificationService;
use crate::services::stripe::{parse_webhook, Charge, CheckoutSession, StripeClient, WebhookEvent};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{format_amount, Paginated, Pagination};
use crate::utils::logging::{log_admin_action, log_booking_event, log_payment_event};

/// What a webhook delivery changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Duplicate,
    Ignored,
    Confirmed(Uuid),
    Closed(Uuid),
    Refunded(Uuid),
    LatePaymentRefunded(Uuid),
}

#[derive(Clone)]
pub struct PaymentService {
    db: DatabaseService,
    stripe: StripeClient,
    bookings: BookingService,
    notifications: NotificationService,
    settings: Settings,
}

impl PaymentService {
    pub fn new(
        db: DatabaseService,
        stripe: StripeClient,
        bookings: BookingService,
        notifications: NotificationService,
        settings: Settings,
    ) -> Self {
        Self {
            db,
            stripe,
            bookings,
            notifications,
            settings,
        }
    }

    /// Verify and apply one webhook delivery
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        let event = parse_webhook(
            payload,
            signature,
            &self.settings.stripe.webhook_secret,
            self.settings.stripe.webhook_tolerance_secs,
        )?;
        debug!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");

        let outcome = match event.kind() {
            Some(EventType::CheckoutSessionCompleted | EventType::CheckoutSessionAsyncPaymentSucceeded) => {
                self.on_session_paid(&event).await?
            }
            Some(EventType::CheckoutSessionExpired) => {
                self.on_session_closed(&event, BookingStatus::Expired).await?
            }
            Some(EventType::CheckoutSessionAsyncPaymentFailed) => {
                self.on_session_closed(&event, BookingStatus::Cancelled).await?
            }
            Some(EventType::ChargeRefunded) => self.on_charge_refunded(&event).await?,
            _ => {
                debug!(event_type = %event.event_type, "Ignoring Stripe event type");
                WebhookOutcome::Ignored
            }
        };

        info!(event_id = %event.id, outcome = ?outcome, "Stripe webhook processed");
        Ok(outcome)
    }

    async fn booking_for_session(
        conn: &mut sqlx::PgConnection,
        session: &CheckoutSession,
    ) -> Result<Option<Booking>> {
        match session.booking_id() {
            Some(id) => BookingRepository::find_for_update(conn, id).await,
            None => BookingRepository::find_by_session_for_update(conn, &session.id).await,
        }
    }

    async fn on_session_paid(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let session: CheckoutSession = event.object()?;
        if !session.is_paid() {
            // delayed payment methods complete later with async_payment_succeeded
            debug!(session_id = %session.id, "Checkout completed without payment yet");
            return Ok(WebhookOutcome::Ignored);
        }

        let mut tx = self.db.begin().await?;
        if !StripeEventRepository::record(&mut *tx, &event.id, &event.event_type).await? {
            return Ok(WebhookOutcome::Duplicate);
        }

        let Some(booking) = Self::booking_for_session(&mut *tx, &session).await? else {
            warn!(session_id = %session.id, "Paid checkout session without a booking");
            tx.commit().await?;
            return Ok(WebhookOutcome::Ignored);
        };
        let intent = session.payment_intent.as_deref();

        match booking.status {
            BookingStatus::Pending => {
                let confirmed = BookingRepository::transition(
                    &mut *tx,
                    booking.id,
                    BookingStatus::Pending,
                    BookingStatus::Confirmed,
                    intent,
                )
                .await?
                .ok_or_else(|| WaddleError::Conflict("booking changed during confirmation".to_string()))?;
                PaymentRepository::transition(
                    &mut *tx,
                    booking.id,
                    PaymentStatus::Pending,
                    PaymentStatus::Succeeded,
                    intent,
                )
                .await?;
                tx.commit().await?;

                log_booking_event(confirmed.id, confirmed.event_id, "confirmed", Some(&session.id));
                log_payment_event(&session.id, "checkout_completed", Some(confirmed.total_cents), true);
                if let Some(event) = self.db.events.find_by_id(confirmed.event_id).await? {
                    self.bookings.announce_confirmation(&confirmed, &event).await;
                }
                Ok(WebhookOutcome::Confirmed(confirmed.id))
            }
            BookingStatus::Confirmed | BookingStatus::Refunded => {
                tx.commit().await?;
                Ok(WebhookOutcome::Duplicate)
            }
            BookingStatus::Expired | BookingStatus::Cancelled => {
                // Paid after the seats were given back: return the money.
                // The ledger row commits only after the refund succeeded.
                let Some(intent) = intent else {
                    warn!(
                        session_id = %session.id,
                        booking_id = %booking.id,
                        "Late payment without a payment intent, nothing to refund"
                    );
                    tx.commit().await?;
                    return Ok(WebhookOutcome::Ignored);
                };
                let refund = self
                    .stripe
                    .create_refund(intent, None, &format!("late-refund-{}", booking.id))
                    .await?;
                tx.commit().await?;

                log_payment_event(&refund.id, "late_payment_refunded", Some(booking.total_cents), true);
                self.notifications
                    .notify_quietly(
                        NewNotification::new(
                            booking.user_id,
                            Role::User,
                            kinds::BOOKING_REFUNDED,
                            "Payment refunded",
                            "Your booking had already expired, so your payment has been refunded.",
                        )
                        .with_data(serde_json::json!({ "booking_id": booking.id })),
                    )
                    .await;
                Ok(WebhookOutcome::LatePaymentRefunded(booking.id))
            }
        }
    }

    async fn on_session_closed(&self, event: &WebhookEvent, to: BookingStatus) -> Result<WebhookOutcome> {
        let session: CheckoutSession = event.object()?;

        let mut tx = self.db.begin().await?;
        if !StripeEventRepository::record(&mut *tx, &event.id, &event.event_type).await? {
            return Ok(WebhookOutcome::Duplicate);
        }
        let Some(booking) = Self::booking_for_session(&mut *tx, &session).await? else {
            tx.commit().await?;
            return Ok(WebhookOutcome::Ignored);
        };

        let closed = close_pending(&mut *tx, booking.id, to).await?;
        tx.commit().await?;

        match closed {
            Some(closed) => {
                log_booking_event(closed.id, closed.event_id, closed.status.as_str(), Some(&session.id));
                Ok(WebhookOutcome::Closed(closed.id))
            }
            None => Ok(WebhookOutcome::Ignored),
        }
    }

    async fn on_charge_refunded(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let charge: Charge = event.object()?;
        let Some(intent) = charge.payment_intent.as_deref() else {
            return Ok(WebhookOutcome::Ignored);
        };
        if !charge.refunded {
            debug!(charge_id = %charge.id, "Partial refund, booking left unchanged");
            return Ok(WebhookOutcome::Ignored);
        }

        let mut tx = self.db.begin().await?;
        if !StripeEventRepository::record(&mut *tx, &event.id, &event.event_type).await? {
            return Ok(WebhookOutcome::Duplicate);
        }
        let Some(booking) = BookingRepository::find_by_payment_intent_for_update(&mut *tx, intent).await? else {
            tx.commit().await?;
            return Ok(WebhookOutcome::Ignored);
        };

        let refunded = record_refund(&mut *tx, booking.id).await?;
        tx.commit().await?;

        match refunded {
            Some(refunded) => {
                log_booking_event(refunded.id, refunded.event_id, "refunded", Some(&charge.id));
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
                Ok(WebhookOutcome::Refunded(refunded.id))
            }
            None => Ok(WebhookOutcome::Ignored),
        }
    }

    pub async fn list_mine(&self, actor: Actor, page: Pagination) -> Result<Paginated<Payment>> {
        let (items, total) = self.db.payments.list_by_user(actor.id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    fn owner_of(actor: &Actor) -> Result<EventOwner> {
        EventOwner::from_actor(actor).ok_or_else(|| {
            WaddleError::PermissionDenied("only vendors and organisers have earnings".to_string())
        })
    }

    async fn earnings_for(&self, conn: &mut sqlx::PgConnection, owner: EventOwner) -> Result<Earnings> {
        let revenue = self.db.payments.revenue_for_owner(owner).await?;
        let payouts = PayoutRepository::totals_for_owner(conn, owner).await?;
        Ok(Earnings::compute(
            self.settings.stripe.currency.clone(),
            revenue.gross_cents,
            revenue.platform_fee_cents,
            payouts.paid_cents,
            payouts.pending_cents,
        ))
    }

    pub async fn earnings(&self, actor: Actor) -> Result<Earnings> {
        let owner = Self::owner_of(&actor)?;
        let mut conn = self.db.pool().acquire().await?;
        self.earnings_for(&mut *conn, owner).await
    }

    /// Request a payout of part of the available balance
    pub async fn request_payout(&self, actor: Actor, request: CreatePayoutRequest) -> Result<Payout> {
        request.validate()?;
        let owner = Self::owner_of(&actor)?;

        let mut tx = self.db.begin().await?;
        PayoutRepository::lock_owner(&mut *tx, owner).await?;
        let earnings = self.earnings_for(&mut *tx, owner).await?;
        if request.amount_cents > earnings.available_cents {
            return Err(WaddleError::BadRequest(format!(
                "amount exceeds the available balance of {}",
                format_amount(earnings.available_cents, &earnings.currency)
            )));
        }

        let payout = PayoutRepository::create(
            &mut *tx,
            owner,
            request.amount_cents,
            &earnings.currency,
            request.note.as_deref(),
        )
        .await?;
        tx.commit().await?;

        info!(payout_id = %payout.id, owner = %owner.id(), amount = payout.amount_cents, "Payout requested");
        Ok(payout)
    }

    pub async fn list_my_payouts(&self, actor: Actor, page: Pagination) -> Result<Paginated<Payout>> {
        let owner = Self::owner_of(&actor)?;
        let (items, total) = self.db.payouts.list_by_owner(owner, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_payouts(&self, status: Option<PayoutStatus>, page: Pagination) -> Result<Paginated<Payout>> {
        let (items, total) = self.db.payouts.list(status, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Mark a pending payout paid or rejected
    pub async fn process_payout(&self, admin: Actor, id: Uuid, request: ProcessPayoutRequest) -> Result<Payout> {
        request.validate()?;
        let payout = self
            .db
            .payouts
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("payout", id))?;
        if payout.status != PayoutStatus::Pending {
            return Err(WaddleError::InvalidStateTransition {
                from: payout.status.as_str().to_string(),
                to: request.status.as_str().to_string(),
            });
        }
        let owner = payout
            .owner()
            .ok_or_else(|| WaddleError::Conflict("payout has no owner".to_string()))?;

        let transfer_id = if request.status == PayoutStatus::Paid {
            match self.connected_account(owner).await? {
                Some(account) => {
                    let transfer = self
                        .stripe
                        .create_transfer(
                            payout.amount_cents,
                            &payout.currency,
                            &account,
                            &format!("payout-{}", payout.id),
                        )
                        .await?;
                    log_payment_event(&transfer.id, "payout_transfer", Some(payout.amount_cents), true);
                    Some(transfer.id)
                }
                None => None,
            }
        } else {
            None
        };

        let processed = self
            .db
            .payouts
            .process(id, request.status, admin.id, request.note.as_deref(), transfer_id.as_deref())
            .await?
            .ok_or_else(|| WaddleError::InvalidStateTransition {
                from: "processed".to_string(),
                to: request.status.as_str().to_string(),
            })?;

        log_admin_action(admin.id, "process_payout", Some(&id.to_string()), Some(request.status.as_str()));
        self.notifications
            .notify_quietly(
                NewNotification::new(
                    owner.id(),
                    owner.role(),
                    kinds::PAYOUT_UPDATED,
                    "Payout update",
                    format!(
                        "Your payout of {} was {}.",
                        format_amount(processed.amount_cents, &processed.currency),
                        processed.status.as_str()
                    ),
                )
                .with_data(serde_json::json!({ "payout_id": processed.id })),
            )
            .await;
        Ok(processed)
    }

    async fn connected_account(&self, owner: EventOwner) -> Result<Option<String>> {
        let account = match owner {
            EventOwner::Vendor(id) => self.db.vendors.find_by_id(id).await?.and_then(|v| v.stripe_account_id),
            EventOwner::Organiser(id) => self
                .db
                .organisers
                .find_by_id(id)
                .await?
                .and_then(|o| o.stripe_account_id),
        };
        Ok(account.filter(|a| !a.is_empty()))
    }
}
