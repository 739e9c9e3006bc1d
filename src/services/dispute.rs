//! Dispute service implementation
//!
//! Customers open disputes against their own confirmed or refunded bookings.
//! Admins move them pending -> in_review -> resolved, optionally refunding the
//! booking when resolving.

use tracing::info;
use uuid::Uuid;

use crate::database::repositories::DisputeRepository;
use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{
    Actor, BookingStatus, CreateDisputeRequest, Dispute, DisputeFilter, DisputeStatus, NewNotification,
    Role, UpdateDisputeStatusRequest, Validate,
};
use crate::services::booking::BookingService;
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct DisputeService {
    db: DatabaseService,
    bookings: BookingService,
    notifications: NotificationService,
}

impl DisputeService {
    pub fn new(db: DatabaseService, bookings: BookingService, notifications: NotificationService) -> Self {
        Self {
            db,
            bookings,
            notifications,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Dispute> {
        self.db
            .disputes
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("dispute", id))
    }

    pub async fn create(&self, actor: Actor, request: CreateDisputeRequest) -> Result<Dispute> {
        request.validate()?;
        let booking = self
            .db
            .bookings
            .find_by_id(request.booking_id)
            .await?
            .ok_or_else(|| WaddleError::not_found("booking", request.booking_id))?;
        if booking.user_id != actor.id {
            return Err(WaddleError::PermissionDenied(
                "you can only dispute your own bookings".to_string(),
            ));
        }
        if !matches!(booking.status, BookingStatus::Confirmed | BookingStatus::Refunded) {
            return Err(WaddleError::BadRequest(format!(
                "{} bookings cannot be disputed",
                booking.status.as_str()
            )));
        }

        let dispute = self.db.disputes.create(actor.id, request).await?;
        info!(dispute_id = %dispute.id, booking_id = %dispute.booking_id, "Dispute opened");
        Ok(dispute)
    }

    /// Owner or admin
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<Dispute> {
        let dispute = self.load(id).await?;
        if !actor.is_admin() && dispute.user_id != actor.id {
            return Err(WaddleError::PermissionDenied("you cannot view this dispute".to_string()));
        }
        Ok(dispute)
    }

    pub async fn list_mine(&self, actor: Actor, page: Pagination) -> Result<Paginated<Dispute>> {
        let (items, total) = self.db.disputes.list(Some(actor.id), None, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_all(&self, filter: DisputeFilter, page: Pagination) -> Result<Paginated<Dispute>> {
        let (items, total) = self.db.disputes.list(None, filter.status, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_status(
        &self,
        admin: Actor,
        id: Uuid,
        request: UpdateDisputeStatusRequest,
    ) -> Result<Dispute> {
        request.validate()?;
        let current = self.load(id).await?;
        current.status.transition(request.status)?;

        let mut refund_issued = false;
        if request.refund {
            let booking = self
                .db
                .bookings
                .find_by_id(current.booking_id)
                .await?
                .ok_or_else(|| WaddleError::not_found("booking", current.booking_id))?;
            match booking.status {
                BookingStatus::Confirmed => {
                    let refunded = self.bookings.refund_confirmed(&booking).await?;
                    refund_issued = refunded.status == BookingStatus::Refunded;
                }
                BookingStatus::Refunded => refund_issued = true,
                other => {
                    return Err(WaddleError::BadRequest(format!(
                        "{} bookings cannot be refunded",
                        other.as_str()
                    )))
                }
            }
        }

        let mut tx = self.db.begin().await?;
        let locked = DisputeRepository::find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| WaddleError::not_found("dispute", id))?;
        locked.status.transition(request.status)?;
        let dispute = DisputeRepository::update_status(
            &mut *tx,
            id,
            request.status,
            request.resolution_note.as_deref(),
            refund_issued,
            admin.id,
        )
        .await?;
        tx.commit().await?;

        log_admin_action(admin.id, "update_dispute", Some(&id.to_string()), Some(dispute.status.as_str()));

        let body = match dispute.status {
            DisputeStatus::InReview => "Your dispute is being reviewed.".to_string(),
            DisputeStatus::Resolved if dispute.refund_issued => {
                "Your dispute has been resolved and your booking refunded.".to_string()
            }
            _ => "Your dispute has been resolved.".to_string(),
        };
        self.notifications
            .notify_quietly(
                NewNotification::new(dispute.user_id, Role::User, kinds::DISPUTE_UPDATED, "Dispute update", body)
                    .with_data(serde_json::json!({
                        "dispute_id": dispute.id,
                        "status": dispute.status,
                    })),
            )
            .await;
        Ok(dispute)
    }
}
