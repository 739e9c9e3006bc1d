//! Activity model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Actor, Role, Validate};
use crate::utils::errors::Result;
use crate::utils::helpers::{optional_text, require_text, validate_age_range};

/// A standing attraction or place, not bookable
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub price_note: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub organiser_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        match actor.role {
            Role::Vendor => self.vendor_id == Some(actor.id),
            Role::Organiser => self.organiser_id == Some(actor.id),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub price_note: Option<String>,
}

impl Validate for CreateActivityRequest {
    fn validate(&self) -> Result<()> {
        require_text("title", &self.title, 200)?;
        require_text("category", &self.category, 100)?;
        optional_text("description", self.description.as_deref(), 10_000)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("city", self.city.as_deref(), 100)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)?;
        optional_text("price_note", self.price_note.as_deref(), 200)?;
        validate_age_range(self.min_age, self.max_age)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub price_note: Option<String>,
}

impl Validate for UpdateActivityRequest {
    fn validate(&self) -> Result<()> {
        optional_text("title", self.title.as_deref(), 200)?;
        optional_text("category", self.category.as_deref(), 100)?;
        optional_text("description", self.description.as_deref(), 10_000)?;
        optional_text("address", self.address.as_deref(), 500)?;
        optional_text("city", self.city.as_deref(), 100)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)?;
        optional_text("price_note", self.price_note.as_deref(), 200)?;
        validate_age_range(self.min_age, self.max_age)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
}
