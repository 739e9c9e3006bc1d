//! Vendor service implementation

use tracing::debug;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{Actor, NewNotification, Role, UpdateVendorRequest, Validate, Vendor};
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::{log_account_action, log_admin_action};

#[derive(Clone)]
pub struct VendorService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl VendorService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    pub async fn get(&self, id: Uuid) -> Result<Vendor> {
        self.db
            .vendors
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("vendor", id))
    }

    /// Approved, unbanned vendors only
    pub async fn get_public(&self, id: Uuid) -> Result<Vendor> {
        match self.db.vendors.find_by_id(id).await? {
            Some(vendor) if vendor.is_approved && !vendor.is_banned => Ok(vendor),
            _ => Err(WaddleError::not_found("vendor", id)),
        }
    }

    pub async fn list_public(&self, search: Option<&str>, page: Pagination) -> Result<Paginated<Vendor>> {
        let (items, total) = self.db.vendors.list(true, search, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_all(&self, search: Option<&str>, page: Pagination) -> Result<Paginated<Vendor>> {
        let (items, total) = self.db.vendors.list(false, search, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_profile(&self, actor: Actor, request: UpdateVendorRequest) -> Result<Vendor> {
        request.validate()?;
        debug!(vendor_id = %actor.id, "Updating vendor profile");
        let vendor = self.db.vendors.update(actor.id, request).await?;
        log_account_action(vendor.id, Role::Vendor, "profile_updated", None);
        Ok(vendor)
    }

    pub async fn set_approval(&self, admin: Actor, id: Uuid, approved: bool) -> Result<Vendor> {
        let vendor = self.db.vendors.set_approval(id, approved).await?;
        log_admin_action(
            admin.id,
            if approved { "approve_vendor" } else { "unapprove_vendor" },
            Some(&id.to_string()),
            None,
        );

        let body = if approved {
            "Your vendor account has been approved."
        } else {
            "Your vendor account approval has been withdrawn."
        };
        self.notifications
            .notify_quietly(NewNotification::new(
                vendor.id,
                Role::Vendor,
                kinds::ACCOUNT_UPDATED,
                "Account status updated",
                body,
            ))
            .await;
        Ok(vendor)
    }

    pub async fn set_banned(&self, admin: Actor, id: Uuid, banned: bool) -> Result<Vendor> {
        let vendor = self.db.vendors.set_ban_status(id, banned).await?;
        log_admin_action(
            admin.id,
            if banned { "ban_vendor" } else { "unban_vendor" },
            Some(&id.to_string()),
            None,
        );
        Ok(vendor)
    }
}
