//! Likes and favorites

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub activity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFavoriteRequest {
    pub event_id: Option<Uuid>,
    pub activity_id: Option<Uuid>,
}

impl Validate for CreateFavoriteRequest {
    fn validate(&self) -> Result<()> {
        match (self.event_id, self.activity_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(WaddleError::Validation(
                "exactly one of event_id or activity_id is required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_needs_exactly_one_target() {
        let id = Some(Uuid::new_v4());
        assert!(CreateFavoriteRequest { event_id: id, activity_id: None }.validate().is_ok());
        assert!(CreateFavoriteRequest { event_id: None, activity_id: id }.validate().is_ok());
        assert!(CreateFavoriteRequest { event_id: None, activity_id: None }.validate().is_err());
        assert!(CreateFavoriteRequest { event_id: id, activity_id: id }.validate().is_err());
    }
}
