//! User (parent) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Validate;
use crate::utils::errors::Result;
use crate::utils::helpers::optional_text;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub fcm_token: Option<String>,
    pub is_banned: bool,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<()> {
        optional_text("first_name", self.first_name.as_deref(), 100)?;
        optional_text("last_name", self.last_name.as_deref(), 100)?;
        optional_text("phone", self.phone.as_deref(), 32)?;
        optional_text("avatar_url", self.avatar_url.as_deref(), 2048)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "parent@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: "Pat".into(),
            last_name: "Parent".into(),
            phone: None,
            avatar_url: None,
            fcm_token: Some("device".into()),
            is_banned: false,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("fcm_token").is_none());
        assert_eq!(user.full_name(), "Pat Parent");
    }

    #[test]
    fn test_update_validation() {
        let ok = UpdateUserRequest {
            first_name: Some("Sam".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let blank = UpdateUserRequest {
            last_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }
}
