//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::optional_text;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_rating(rating: i16) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(WaddleError::Validation("rating must be between 1 and 5".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<()> {
        validate_rating(self.rating)?;
        optional_text("comment", self.comment.as_deref(), 2000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl Validate for UpdateReviewRequest {
    fn validate(&self) -> Result<()> {
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        optional_text("comment", self.comment.as_deref(), 2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        for rating in 1..=5 {
            assert!(CreateReviewRequest { rating, comment: None }.validate().is_ok());
        }
        assert!(CreateReviewRequest { rating: 0, comment: None }.validate().is_err());
        assert!(CreateReviewRequest { rating: 6, comment: None }.validate().is_err());
        assert!(UpdateReviewRequest { rating: Some(9), comment: None }.validate().is_err());
        assert!(UpdateReviewRequest::default().validate().is_ok());
    }
}
