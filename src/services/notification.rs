//! Notification service implementation
//!
//! Every notification is stored in the database first; when the recipient has
//! registered a device token it is also delivered as a push message in the
//! background.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{
    Actor, BroadcastRequest, DeviceTokenRequest, NewNotification, Notification, NotificationFilter,
    Validate,
};
use crate::services::push::PushSender;
use crate::utils::errors::Result;
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::log_admin_action;

/// Outcome of an admin broadcast
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastSummary {
    pub recipients: u64,
    pub pushed: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseService,
    push: PushSender,
}

impl NotificationService {
    pub fn new(db: DatabaseService, push: PushSender) -> Self {
        Self { db, push }
    }

    /// Store a notification and push it to the recipient's device
    pub async fn notify(&self, notification: NewNotification) -> Result<Notification> {
        let stored = self.db.notifications.create(&notification).await?;

        if self.push.is_enabled() {
            match self
                .db
                .accounts
                .device_token(notification.recipient_role, notification.recipient_id)
                .await
            {
                Ok(Some(token)) => self.spawn_push(token, &stored),
                Ok(None) => debug!(recipient_id = %stored.recipient_id, "No device token, push skipped"),
                Err(e) => warn!(error = %e, "Failed to load device token"),
            }
        }

        Ok(stored)
    }

    /// Like [`notify`](Self::notify) but only logs failures
    pub async fn notify_quietly(&self, notification: NewNotification) {
        let recipient_id = notification.recipient_id;
        let kind = notification.kind.clone();
        if let Err(e) = self.notify(notification).await {
            warn!(error = %e, recipient_id = %recipient_id, kind = %kind, "Failed to store notification");
        }
    }

    fn spawn_push(&self, token: String, notification: &Notification) {
        let push = self.push.clone();
        let title = notification.title.clone();
        let body = notification.body.clone();
        let data = serde_json::json!({
            "notification_id": notification.id,
            "kind": notification.kind,
            "data": notification.data,
        });
        tokio::spawn(async move {
            push.send(&token, &title, &body, &data).await;
        });
    }

    pub async fn list(
        &self,
        actor: Actor,
        filter: NotificationFilter,
        page: Pagination,
    ) -> Result<Paginated<Notification>> {
        let (items, total) = self
            .db
            .notifications
            .list(actor.id, actor.role, filter.unread_only, page)
            .await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn mark_read(&self, actor: Actor, id: Uuid) -> Result<Notification> {
        self.db.notifications.mark_read(id, actor.id, actor.role).await
    }

    pub async fn mark_all_read(&self, actor: Actor) -> Result<u64> {
        self.db.notifications.mark_all_read(actor.id, actor.role).await
    }

    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<()> {
        self.db.notifications.delete(id, actor.id, actor.role).await
    }

    /// Register or clear the caller's push token
    pub async fn set_device_token(&self, actor: Actor, request: DeviceTokenRequest) -> Result<()> {
        request.validate()?;
        let token = request.token.as_deref().map(str::trim);
        self.db.accounts.set_device_token(actor.role, actor.id, token).await?;
        debug!(account_id = %actor.id, registered = token.is_some(), "Device token updated");
        Ok(())
    }

    /// Send one message to every active account of the audience
    pub async fn broadcast(&self, admin: Actor, request: BroadcastRequest) -> Result<BroadcastSummary> {
        request.validate()?;
        let mut summary = BroadcastSummary {
            recipients: 0,
            pushed: 0,
        };

        for role in request.audience.roles() {
            let targets = self.db.accounts.active_targets(*role).await?;
            if targets.is_empty() {
                continue;
            }
            let ids: Vec<Uuid> = targets.iter().map(|t| t.id).collect();
            summary.recipients += self
                .db
                .notifications
                .create_for_all(&ids, *role, kinds::BROADCAST, &request.title, &request.body)
                .await?;

            if self.push.is_enabled() {
                for token in targets.into_iter().filter_map(|t| t.fcm_token) {
                    let push = self.push.clone();
                    let title = request.title.clone();
                    let body = request.body.clone();
                    tokio::spawn(async move {
                        push.send(&token, &title, &body, &serde_json::json!({ "kind": kinds::BROADCAST }))
                            .await;
                    });
                    summary.pushed += 1;
                }
            }
        }

        log_admin_action(
            admin.id,
            "broadcast",
            None,
            Some(&format!("{} recipients", summary.recipients)),
        );
        info!(recipients = summary.recipients, pushed = summary.pushed, "Broadcast sent");
        Ok(summary)
    }
}
