//! Organiser service implementation

use tracing::debug;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{Actor, NewNotification, Organiser, Role, UpdateOrganiserRequest, Validate};
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::{log_account_action, log_admin_action};

#[derive(Clone)]
pub struct OrganiserService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl OrganiserService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    pub async fn get(&self, id: Uuid) -> Result<Organiser> {
        self.db
            .organisers
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("organiser", id))
    }

    pub async fn get_public(&self, id: Uuid) -> Result<Organiser> {
        match self.db.organisers.find_by_id(id).await? {
            Some(organiser) if organiser.is_approved && !organiser.is_banned => Ok(organiser),
            _ => Err(WaddleError::not_found("organiser", id)),
        }
    }

    pub async fn list_public(&self, search: Option<&str>, page: Pagination) -> Result<Paginated<Organiser>> {
        let (items, total) = self.db.organisers.list(true, search, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_all(&self, search: Option<&str>, page: Pagination) -> Result<Paginated<Organiser>> {
        let (items, total) = self.db.organisers.list(false, search, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_profile(&self, actor: Actor, request: UpdateOrganiserRequest) -> Result<Organiser> {
        request.validate()?;
        debug!(organiser_id = %actor.id, "Updating organiser profile");
        let organiser = self.db.organisers.update(actor.id, request).await?;
        log_account_action(organiser.id, Role::Organiser, "profile_updated", None);
        Ok(organiser)
    }

    pub async fn set_approval(&self, admin: Actor, id: Uuid, approved: bool) -> Result<Organiser> {
        let organiser = self.db.organisers.set_approval(id, approved).await?;
        log_admin_action(
            admin.id,
            if approved { "approve_organiser" } else { "unapprove_organiser" },
            Some(&id.to_string()),
            None,
        );

        let body = if approved {
            "Your organiser account has been approved."
        } else {
            "Your organiser account approval has been withdrawn."
        };
        self.notifications
            .notify_quietly(NewNotification::new(
                organiser.id,
                Role::Organiser,
                kinds::ACCOUNT_UPDATED,
                "Account status updated",
                body,
            ))
            .await;
        Ok(organiser)
    }

    pub async fn set_banned(&self, admin: Actor, id: Uuid, banned: bool) -> Result<Organiser> {
        let organiser = self.db.organisers.set_ban_status(id, banned).await?;
        log_admin_action(
            admin.id,
            if banned { "ban_organiser" } else { "unban_organiser" },
            Some(&id.to_string()),
            None,
        );
        Ok(organiser)
    }
}
