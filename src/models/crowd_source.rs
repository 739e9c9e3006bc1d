//! Crowd-sourced listings submitted by parents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{optional_text, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "crowd_source_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CrowdSourceKind {
    Event,
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "crowd_source_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CrowdSourceStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrowdSource {
    pub id: Uuid,
    pub submitted_by: Uuid,
    pub kind: CrowdSourceKind,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub status: CrowdSourceStatus,
    pub review_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCrowdSourceRequest {
    pub kind: CrowdSourceKind,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

impl Validate for CreateCrowdSourceRequest {
    fn validate(&self) -> Result<()> {
        require_text("title", &self.title, 200)?;
        optional_text("description", self.description.as_deref(), 5000)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("city", self.city.as_deref(), 100)?;
        optional_text("website", self.website.as_deref(), 2048)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)?;
        if self.kind == CrowdSourceKind::Event && self.starts_at.is_none() {
            return Err(WaddleError::Validation(
                "starts_at is required for event submissions".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCrowdSourceRequest {
    pub status: CrowdSourceStatus,
    pub note: Option<String>,
}

impl Validate for ReviewCrowdSourceRequest {
    fn validate(&self) -> Result<()> {
        if self.status == CrowdSourceStatus::Pending {
            return Err(WaddleError::Validation(
                "status must be verified or rejected".to_string(),
            ));
        }
        optional_text("note", self.note.as_deref(), 2000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrowdSourceFilter {
    pub status: Option<CrowdSourceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_submission_needs_start() {
        let mut req = CreateCrowdSourceRequest {
            kind: CrowdSourceKind::Event,
            title: "Library rhyme time".into(),
            description: None,
            address: None,
            city: Some("York".into()),
            website: None,
            image_url: None,
            starts_at: None,
        };
        assert!(req.validate().is_err());
        req.kind = CrowdSourceKind::Place;
        assert!(req.validate().is_ok());
    }
}
