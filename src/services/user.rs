//! User service implementation
//!
//! Profile management for parents and the admin views over user accounts.

use tracing::{debug, info};
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{Actor, UpdateUserRequest, User, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::{log_account_action, log_admin_action};

#[derive(Clone)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.db
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("user", id))
    }

    pub async fn update_profile(&self, actor: Actor, request: UpdateUserRequest) -> Result<User> {
        request.validate()?;
        debug!(user_id = %actor.id, "Updating user profile");

        let user = self.db.users.update(actor.id, request).await?;
        log_account_action(user.id, actor.role, "profile_updated", None);
        Ok(user)
    }

    /// Soft delete the caller's account; its email becomes free again
    pub async fn delete_account(&self, actor: Actor) -> Result<()> {
        self.db.users.soft_delete(actor.id).await?;
        info!(user_id = %actor.id, "User account deleted");
        log_account_action(actor.id, actor.role, "account_deleted", None);
        Ok(())
    }

    pub async fn list(&self, search: Option<&str>, page: Pagination) -> Result<Paginated<User>> {
        let (items, total) = self.db.users.list(search, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn set_banned(&self, admin: Actor, id: Uuid, banned: bool) -> Result<User> {
        let user = self.db.users.set_ban_status(id, banned).await?;
        log_admin_action(
            admin.id,
            if banned { "ban_user" } else { "unban_user" },
            Some(&id.to_string()),
            None,
        );
        Ok(user)
    }
}
