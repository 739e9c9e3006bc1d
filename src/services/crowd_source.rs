//! Crowd-sourced listing service

use tracing::info;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::notification::kinds;
use crate::models::{
    Actor, CreateCrowdSourceRequest, CrowdSource, CrowdSourceFilter, CrowdSourceStatus, NewNotification,
    ReviewCrowdSourceRequest, Role, Validate,
};
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct CrowdSourceService {
    db: DatabaseService,
    notifications: NotificationService,
}

impl CrowdSourceService {
    pub fn new(db: DatabaseService, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    pub async fn submit(&self, actor: Actor, request: CreateCrowdSourceRequest) -> Result<CrowdSource> {
        request.validate()?;
        let entry = self.db.crowd_sources.create(actor.id, request).await?;
        info!(crowd_source_id = %entry.id, user_id = %actor.id, "Crowd source submitted");
        Ok(entry)
    }

    pub async fn list_mine(&self, actor: Actor, page: Pagination) -> Result<Paginated<CrowdSource>> {
        let (items, total) = self.db.crowd_sources.list(Some(actor.id), None, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_verified(&self, page: Pagination) -> Result<Paginated<CrowdSource>> {
        let (items, total) = self
            .db
            .crowd_sources
            .list(None, Some(CrowdSourceStatus::Verified), page)
            .await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_all(&self, filter: CrowdSourceFilter, page: Pagination) -> Result<Paginated<CrowdSource>> {
        let (items, total) = self.db.crowd_sources.list(None, filter.status, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn review(&self, admin: Actor, id: Uuid, request: ReviewCrowdSourceRequest) -> Result<CrowdSource> {
        request.validate()?;
        let current = self
            .db
            .crowd_sources
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("crowd source", id))?;

        let entry = self
            .db
            .crowd_sources
            .review(id, request.status, admin.id, request.note.as_deref())
            .await?
            .ok_or_else(|| WaddleError::InvalidStateTransition {
                from: format!("{:?}", current.status).to_lowercase(),
                to: format!("{:?}", request.status).to_lowercase(),
            })?;

        let verdict = match entry.status {
            CrowdSourceStatus::Verified => "verified",
            _ => "rejected",
        };
        log_admin_action(admin.id, "review_crowd_source", Some(&id.to_string()), Some(verdict));
        self.notifications
            .notify_quietly(
                NewNotification::new(
                    entry.submitted_by,
                    Role::User,
                    kinds::CROWD_SOURCE_REVIEWED,
                    "Submission reviewed",
                    format!("Your submission \"{}\" was {}.", entry.title, verdict),
                )
                .with_data(serde_json::json!({ "crowd_source_id": entry.id })),
            )
            .await;
        Ok(entry)
    }
}
