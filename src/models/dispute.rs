//! Dispute model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{optional_text, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Pending,
    InReview,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Pending => "pending",
            DisputeStatus::InReview => "in_review",
            DisputeStatus::Resolved => "resolved",
        }
    }

    /// Disputes only move forward one step at a time
    pub fn can_transition_to(&self, next: DisputeStatus) -> bool {
        matches!(
            (self, next),
            (DisputeStatus::Pending, DisputeStatus::InReview)
                | (DisputeStatus::InReview, DisputeStatus::Resolved)
        )
    }

    pub fn transition(self, next: DisputeStatus) -> Result<DisputeStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(WaddleError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dispute {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub description: String,
    pub status: DisputeStatus,
    pub resolution_note: Option<String>,
    pub refund_issued: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDisputeRequest {
    pub booking_id: Uuid,
    pub reason: String,
    pub description: String,
}

impl Validate for CreateDisputeRequest {
    fn validate(&self) -> Result<()> {
        require_text("reason", &self.reason, 200)?;
        require_text("description", &self.description, 5000)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDisputeStatusRequest {
    pub status: DisputeStatus,
    pub resolution_note: Option<String>,
    #[serde(default)]
    pub refund: bool,
}

impl Validate for UpdateDisputeStatusRequest {
    fn validate(&self) -> Result<()> {
        optional_text("resolution_note", self.resolution_note.as_deref(), 5000)?;
        if self.refund && self.status != DisputeStatus::Resolved {
            return Err(WaddleError::Validation(
                "refund can only be issued when resolving".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisputeFilter {
    pub status: Option<DisputeStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_dispute_state_machine() {
        use DisputeStatus::*;
        assert!(Pending.can_transition_to(InReview));
        assert!(InReview.can_transition_to(Resolved));
        assert!(!Pending.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Pending));
        assert!(!Resolved.can_transition_to(InReview));
        assert!(!InReview.can_transition_to(InReview));

        assert_matches!(
            Pending.transition(Resolved),
            Err(WaddleError::InvalidStateTransition { from, to }) if from == "pending" && to == "resolved"
        );
    }

    #[test]
    fn test_status_serde() {
        let status: DisputeStatus = serde_json::from_str("\"in_review\"").unwrap();
        assert_eq!(status, DisputeStatus::InReview);
    }

    #[test]
    fn test_refund_only_on_resolve() {
        let req = UpdateDisputeStatusRequest {
            status: DisputeStatus::InReview,
            resolution_note: None,
            refund: true,
        };
        assert!(req.validate().is_err());
    }
}
