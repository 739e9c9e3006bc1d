//! Review service implementation

use tracing::debug;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{Actor, CreateReviewRequest, Event, Review, UpdateReviewRequest, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{Paginated, Pagination};

#[derive(Clone)]
pub struct ReviewService {
    db: DatabaseService,
}

impl ReviewService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    async fn load_event(&self, id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("event", id))
    }

    async fn load(&self, id: Uuid) -> Result<Review> {
        self.db
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| WaddleError::not_found("review", id))
    }

    /// Only customers who attended with a confirmed booking may review
    pub async fn create(&self, actor: Actor, event_id: Uuid, request: CreateReviewRequest) -> Result<Review> {
        request.validate()?;
        self.load_event(event_id).await?;
        if !self.db.bookings.has_confirmed(actor.id, event_id).await? {
            return Err(WaddleError::PermissionDenied(
                "only customers with a confirmed booking can review this event".to_string(),
            ));
        }

        let review = self.db.reviews.create(actor.id, event_id, request).await?;
        debug!(review_id = %review.id, event_id = %event_id, "Review created");
        Ok(review)
    }

    pub async fn list_for_event(&self, event_id: Uuid, page: Pagination) -> Result<Paginated<Review>> {
        self.load_event(event_id).await?;
        let (items, total) = self.db.reviews.list_by_event(event_id, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update(&self, actor: Actor, id: Uuid, request: UpdateReviewRequest) -> Result<Review> {
        request.validate()?;
        let review = self.load(id).await?;
        if review.user_id != actor.id {
            return Err(WaddleError::PermissionDenied("you can only edit your own reviews".to_string()));
        }
        self.db.reviews.update(id, request).await
    }

    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<()> {
        let review = self.load(id).await?;
        if !actor.is_admin() && review.user_id != actor.id {
            return Err(WaddleError::PermissionDenied(
                "you can only delete your own reviews".to_string(),
            ));
        }
        self.db.reviews.delete(id).await
    }
}
