//! Vendor model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::Result;
use crate::utils::helpers::optional_text;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
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
pub struct CreateVendorRequest {
    pub email: String,
    pub password_hash: String,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub is_approved: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVendorRequest {
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub stripe_account_id: Option<String>,
}

impl Validate for UpdateVendorRequest {
    fn validate(&self) -> Result<()> {
        optional_text("business_name", self.business_name.as_deref(), 200)?;
        optional_text("contact_name", self.contact_name.as_deref(), 200)?;
        optional_text("phone", self.phone.as_deref(), 32)?;
        optional_text("description", self.description.as_deref(), 5000)?;
        optional_text("website", self.website.as_deref(), 2048)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("logo_url", self.logo_url.as_deref(), 2048)?;
        optional_text("stripe_account_id", self.stripe_account_id.as_deref(), 255)?;
        Ok(())
    }
}
