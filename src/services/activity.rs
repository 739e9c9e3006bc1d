//! Activity service implementation

use tracing::info;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{
    Activity, ActivityFilter, Actor, CreateActivityRequest, EventOwner, UpdateActivityRequest, Validate,
};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct ActivityService {
    db: DatabaseService,
}

impl ActivityService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Activity> {
        self.db
            .activities
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("activity", id))
    }

    pub async fn list(&self, filter: ActivityFilter, page: Pagination) -> Result<Paginated<Activity>> {
        let (items, total) = self.db.activities.list(&filter, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Providers own what they create; admin entries have no owner
    pub async fn create(&self, actor: Actor, request: CreateActivityRequest) -> Result<Activity> {
        request.validate()?;
        let owner = EventOwner::from_actor(&actor);
        if owner.is_none() && !actor.is_admin() {
            return Err(WaddleError::PermissionDenied(
                "only providers and admins can create activities".to_string(),
            ));
        }

        let activity = self.db.activities.create(owner, request).await?;
        info!(activity_id = %activity.id, "Activity created");
        Ok(activity)
    }

    async fn load_managed(&self, actor: Actor, id: Uuid) -> Result<Activity> {
        let activity = self.get(id).await?;
        if !actor.is_admin() && !activity.is_owned_by(&actor) {
            return Err(WaddleError::PermissionDenied("you do not own this activity".to_string()));
        }
        Ok(activity)
    }

    pub async fn update(&self, actor: Actor, id: Uuid, request: UpdateActivityRequest) -> Result<Activity> {
        request.validate()?;
        let activity = self.load_managed(actor, id).await?;

        let min_age = request.min_age.or(activity.min_age);
        let max_age = request.max_age.or(activity.max_age);
        if let (Some(min), Some(max)) = (min_age, max_age) {
            if min > max {
                return Err(WaddleError::Validation("min_age cannot exceed max_age".to_string()));
            }
        }
        self.db.activities.update(id, request).await
    }

    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<()> {
        self.load_managed(actor, id).await?;
        self.db.activities.delete(id).await?;
        if actor.is_admin() {
            log_admin_action(actor.id, "delete_activity", Some(&id.to_string()), None);
        }
        Ok(())
    }
}
