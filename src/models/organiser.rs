//! Organiser model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::Result;
use crate::utils::helpers::optional_text;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organiser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub organisation_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub stripe_account_id: Option<String>,
    #[serde(skip_serializing)]
    pub fcm_token: Option<String>,
    pub is_approved: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateOrganiserRequest {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub organisation_name: Option<String>,
    pub phone: Option<String>,
    pub is_approved: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganiserRequest {
    pub name: Option<String>,
    pub organisation_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub stripe_account_id: Option<String>,
}

impl Validate for UpdateOrganiserRequest {
    fn validate(&self) -> Result<()> {
        optional_text("name", self.name.as_deref(), 200)?;
        optional_text("organisation_name", self.organisation_name.as_deref(), 200)?;
        optional_text("phone", self.phone.as_deref(), 32)?;
        optional_text("bio", self.bio.as_deref(), 5000)?;
        optional_text("avatar_url", self.avatar_url.as_deref(), 2048)?;
        optional_text("stripe_account_id", self.stripe_account_id.as_deref(), 255)?;
        Ok(())
    }
}
