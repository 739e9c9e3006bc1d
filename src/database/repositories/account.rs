//! Role-independent account operations
//!
//! Users, vendors, organisers and admins live in separate tables but share
//! credentials, device tokens and ban flags. The table is chosen from the
//! [`Role`], never from request input.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::Role;
use crate::utils::errors::{Result, WaddleError};

/// Minimal state checked on every authenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct AccountState {
    pub is_banned: bool,
    pub is_deleted: bool,
}

/// Row used for password verification
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Push target of one account
#[derive(Debug, Clone, FromRow)]
pub struct DeviceTarget {
    pub id: Uuid,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn state(&self, role: Role, id: Uuid) -> Result<Option<AccountState>> {
        let sql = match role {
            Role::User => {
                "SELECT is_banned, deleted_at IS NOT NULL AS is_deleted FROM users WHERE id = $1"
            }
            Role::Vendor => "SELECT is_banned, FALSE AS is_deleted FROM vendors WHERE id = $1",
            Role::Organiser => "SELECT is_banned, FALSE AS is_deleted FROM organisers WHERE id = $1",
            Role::Admin => "SELECT FALSE AS is_banned, FALSE AS is_deleted FROM admins WHERE id = $1",
        };
        let state = sqlx::query_as::<_, AccountState>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(state)
    }

    pub async fn credentials_by_id(&self, role: Role, id: Uuid) -> Result<Option<Credentials>> {
        let credentials = sqlx::query_as::<_, Credentials>(&format!(
            "SELECT id, email, password_hash FROM {} WHERE id = $1",
            role.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn update_password(&self, role: Role, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            role.table()
        ))
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("account", id));
        }
        Ok(())
    }

    /// Store or clear the FCM token of an account
    pub async fn set_device_token(&self, role: Role, id: Uuid, token: Option<&str>) -> Result<()> {
        if role == Role::Admin {
            return Err(WaddleError::BadRequest(
                "admin accounts do not receive push notifications".to_string(),
            ));
        }
        sqlx::query(&format!(
            "UPDATE {} SET fcm_token = $2, updated_at = NOW() WHERE id = $1",
            role.table()
        ))
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn device_token(&self, role: Role, id: Uuid) -> Result<Option<String>> {
        if role == Role::Admin {
            return Ok(None);
        }
        let token: Option<Option<String>> = sqlx::query_scalar(&format!(
            "SELECT fcm_token FROM {} WHERE id = $1",
            role.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token.flatten())
    }

    /// Active accounts of a role, for broadcasts
    pub async fn active_targets(&self, role: Role) -> Result<Vec<DeviceTarget>> {
        let sql = match role {
            Role::User => "SELECT id, fcm_token FROM users WHERE NOT is_banned AND deleted_at IS NULL",
            Role::Vendor => "SELECT id, fcm_token FROM vendors WHERE NOT is_banned",
            Role::Organiser => "SELECT id, fcm_token FROM organisers WHERE NOT is_banned",
            Role::Admin => "SELECT id, NULL::TEXT AS fcm_token FROM admins",
        };
        let targets = sqlx::query_as::<_, DeviceTarget>(sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(targets)
    }

    /// Email address of an account, for transactional mail
    pub async fn email(&self, role: Role, id: Uuid) -> Result<Option<String>> {
        let email = sqlx::query_scalar::<_, String>(&format!(
            "SELECT email FROM {} WHERE id = $1",
            role.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(email)
    }
}
