//! Admin service implementation

use tracing::info;

use crate::config::AdminConfig;
use crate::database::DatabaseService;
use crate::models::{Actor, Admin, AdminStats, CreateAdminRequest, Validate};
use crate::services::auth::hash_password;
use crate::utils::errors::Result;
use crate::utils::helpers::normalize_email;
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct AdminService {
    db: DatabaseService,
}

impl AdminService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn create_admin(&self, creator: Actor, request: CreateAdminRequest) -> Result<Admin> {
        request.validate()?;
        let hash = hash_password(&request.password).await?;
        let admin = self
            .db
            .admins
            .create(&normalize_email(&request.email), &hash, request.name.trim())
            .await?;

        log_admin_action(creator.id, "create_admin", Some(&admin.id.to_string()), None);
        Ok(admin)
    }

    pub async fn stats(&self) -> Result<AdminStats> {
        self.db.admins.get_stats().await
    }

    /// Create the configured initial admin unless it already exists
    pub async fn bootstrap(&self, config: &AdminConfig) -> Result<Option<Admin>> {
        let (Some(email), Some(password)) = (&config.bootstrap_email, &config.bootstrap_password) else {
            return Ok(None);
        };
        let email = normalize_email(email);
        if self.db.admins.find_by_email(&email).await?.is_some() {
            return Ok(None);
        }

        let hash = hash_password(password).await?;
        let name = config.bootstrap_name.as_deref().unwrap_or("Administrator");
        let admin = self.db.admins.create(&email, &hash, name).await?;
        info!(admin_id = %admin.id, "Bootstrap admin account created");
        Ok(Some(admin))
    }
}
