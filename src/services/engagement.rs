//! Likes and favorites

use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{Actor, CreateFavoriteRequest, Favorite, Like, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};

#[derive(Clone)]
pub struct EngagementService {
    db: DatabaseService,
}

impl EngagementService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Only publicly listed events can be liked or favorited
    async fn ensure_public_event(&self, event_id: Uuid) -> Result<()> {
        match self.db.events.find_by_id(event_id).await? {
            Some(event) if event.is_public() => Ok(()),
            _ => Err(WaddleError::not_found("event", event_id)),
        }
    }

    pub async fn like(&self, actor: Actor, event_id: Uuid) -> Result<Like> {
        self.ensure_public_event(event_id).await?;
        self.db.likes.like(actor.id, event_id).await
    }

    pub async fn unlike(&self, actor: Actor, event_id: Uuid) -> Result<()> {
        if !self.db.likes.unlike(actor.id, event_id).await? {
            return Err(WaddleError::not_found("like", event_id));
        }
        Ok(())
    }

    pub async fn list_likes(&self, actor: Actor, page: Pagination) -> Result<Paginated<Like>> {
        let (items, total) = self.db.likes.list_by_user(actor.id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn add_favorite(&self, actor: Actor, request: CreateFavoriteRequest) -> Result<Favorite> {
        request.validate()?;
        if let Some(event_id) = request.event_id {
            self.ensure_public_event(event_id).await?;
        }
        if let Some(activity_id) = request.activity_id {
            if self.db.activities.find_by_id(activity_id).await?.is_none() {
                return Err(WaddleError::not_found("activity", activity_id));
            }
        }
        self.db
            .favorites
            .add(actor.id, request.event_id, request.activity_id)
            .await
    }

    pub async fn list_favorites(&self, actor: Actor, page: Pagination) -> Result<Paginated<Favorite>> {
        let (items, total) = self.db.favorites.list_by_user(actor.id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn delete_favorite(&self, actor: Actor, id: Uuid) -> Result<()> {
        let favorite = self
            .db
            .favorites
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("favorite", id))?;
        if favorite.user_id != actor.id {
            return Err(WaddleError::PermissionDenied(
                "you can only remove your own favorites".to_string(),
            ));
        }
        self.db.favorites.delete(id).await
    }
}
