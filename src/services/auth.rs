//! Authentication service implementation
//!
//! Signup and login for every account type, bearer token issuing and
//! verification, and the password reset flow backed by Redis.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::models::{
    Actor, AuthResponse, ChangePasswordRequest, CreateOrganiserRequest, CreateUserRequest,
    CreateVendorRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, Role,
    SignupRequest, Validate,
};
use crate::services::mail::{password_reset_email, SharedMailer};
use crate::services::redis::RedisService;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{generate_numeric_code, normalize_email};
use crate::utils::logging::log_account_action;

/// Claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor::new(self.sub, self.role)
    }
}

/// Signs and verifies HS256 access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, actor: Actor) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.id,
            role: actor.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Hash a password with Argon2id on the blocking pool
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| WaddleError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| WaddleError::PasswordHash(e.to_string()))?
}

/// Check a password against a stored PHC hash string
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| WaddleError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| WaddleError::PasswordHash(e.to_string()))?
}

/// What login needs to know about an account
struct LoginAccount {
    id: Uuid,
    password_hash: String,
    is_banned: bool,
    profile: serde_json::Value,
}

/// Pending password reset stored in Redis
#[derive(Debug, Serialize, Deserialize)]
struct ResetCode {
    account_id: Uuid,
    code: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    redis: RedisService,
    mailer: SharedMailer,
    tokens: TokenService,
    settings: Settings,
}

impl AuthService {
    pub fn new(
        db: DatabaseService,
        redis: RedisService,
        mailer: SharedMailer,
        tokens: TokenService,
        settings: Settings,
    ) -> Self {
        Self {
            db,
            redis,
            mailer,
            tokens,
            settings,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let password_hash = hash_password(&request.password).await?;
        let approved = !self.settings.features.require_provider_approval;

        let (id, profile) = match request.role {
            Role::User => {
                let user = self
                    .db
                    .users
                    .create(CreateUserRequest {
                        email,
                        password_hash,
                        first_name: request.first_name.unwrap_or_default().trim().to_string(),
                        last_name: request.last_name.unwrap_or_default().trim().to_string(),
                        phone: request.phone,
                    })
                    .await?;
                (user.id, serde_json::to_value(&user)?)
            }
            Role::Vendor => {
                let vendor = self
                    .db
                    .vendors
                    .create(CreateVendorRequest {
                        email,
                        password_hash,
                        business_name: request.business_name.unwrap_or_default().trim().to_string(),
                        contact_name: request.contact_name,
                        phone: request.phone,
                        is_approved: approved,
                    })
                    .await?;
                (vendor.id, serde_json::to_value(&vendor)?)
            }
            Role::Organiser => {
                let organiser = self
                    .db
                    .organisers
                    .create(CreateOrganiserRequest {
                        email,
                        password_hash,
                        name: request.name.unwrap_or_default().trim().to_string(),
                        organisation_name: request.organisation_name,
                        phone: request.phone,
                        is_approved: approved,
                    })
                    .await?;
                (organiser.id, serde_json::to_value(&organiser)?)
            }
            Role::Admin => {
                return Err(WaddleError::Validation(
                    "admin accounts cannot be created by signup".to_string(),
                ))
            }
        };

        log_account_action(id, request.role, "signup", None);
        Ok(AuthResponse {
            token: self.tokens.issue(Actor::new(id, request.role))?,
            role: request.role,
            account: profile,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let account = self
            .find_login_account(request.role, &email)
            .await?
            .ok_or_else(|| WaddleError::Authentication("invalid email or password".to_string()))?;

        if !verify_password(&request.password, &account.password_hash).await? {
            debug!(role = %request.role, "Login rejected: wrong password");
            return Err(WaddleError::Authentication("invalid email or password".to_string()));
        }
        if account.is_banned {
            return Err(WaddleError::PermissionDenied("account is banned".to_string()));
        }

        log_account_action(account.id, request.role, "login", None);
        Ok(AuthResponse {
            token: self.tokens.issue(Actor::new(account.id, request.role))?,
            role: request.role,
            account: account.profile,
        })
    }

    async fn find_login_account(&self, role: Role, email: &str) -> Result<Option<LoginAccount>> {
        let account = match role {
            Role::User => match self.db.users.find_by_email(email).await? {
                Some(user) => Some(LoginAccount {
                    id: user.id,
                    is_banned: user.is_banned,
                    profile: serde_json::to_value(&user)?,
                    password_hash: user.password_hash,
                }),
                None => None,
            },
            Role::Vendor => match self.db.vendors.find_by_email(email).await? {
                Some(vendor) => Some(LoginAccount {
                    id: vendor.id,
                    is_banned: vendor.is_banned,
                    profile: serde_json::to_value(&vendor)?,
                    password_hash: vendor.password_hash,
                }),
                None => None,
            },
            Role::Organiser => match self.db.organisers.find_by_email(email).await? {
                Some(organiser) => Some(LoginAccount {
                    id: organiser.id,
                    is_banned: organiser.is_banned,
                    profile: serde_json::to_value(&organiser)?,
                    password_hash: organiser.password_hash,
                }),
                None => None,
            },
            Role::Admin => match self.db.admins.find_by_email(email).await? {
                Some(admin) => Some(LoginAccount {
                    id: admin.id,
                    is_banned: false,
                    profile: serde_json::to_value(&admin)?,
                    password_hash: admin.password_hash,
                }),
                None => None,
            },
        };
        Ok(account)
    }

    fn reset_key(role: Role, email: &str) -> String {
        format!("password_reset:{}:{}", role, email)
    }

    /// Mail a reset code when the account exists; never reveals whether it does
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<()> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let Some(account) = self.find_login_account(request.role, &email).await? else {
            debug!(role = %request.role, "Password reset requested for unknown account");
            return Ok(());
        };

        let ttl_minutes = self.settings.auth.password_reset_ttl_minutes;
        let code = generate_numeric_code(6);
        self.redis
            .set(
                &Self::reset_key(request.role, &email),
                &ResetCode {
                    account_id: account.id,
                    code: code.clone(),
                },
                Some(ttl_minutes * 60),
            )
            .await?;

        if let Err(e) = self
            .mailer
            .send(password_reset_email(&email, &code, ttl_minutes))
            .await
        {
            warn!(error = %e, account_id = %account.id, "Failed to send password reset email");
        }

        log_account_action(account.id, request.role, "password_reset_requested", None);
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let key = Self::reset_key(request.role, &email);

        let stored: ResetCode = self
            .redis
            .get(&key)
            .await?
            .ok_or_else(|| WaddleError::BadRequest("invalid or expired reset code".to_string()))?;
        if stored.code != request.code {
            return Err(WaddleError::BadRequest("invalid or expired reset code".to_string()));
        }

        let hash = hash_password(&request.new_password).await?;
        self.db
            .accounts
            .update_password(request.role, stored.account_id, &hash)
            .await?;
        self.redis.delete(&key).await?;

        info!(account_id = %stored.account_id, role = %request.role, "Password reset completed");
        Ok(())
    }

    pub async fn change_password(&self, actor: Actor, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let credentials = self
            .db
            .accounts
            .credentials_by_id(actor.role, actor.id)
            .await?
            .ok_or_else(|| WaddleError::Authentication("account no longer exists".to_string()))?;

        if !verify_password(&request.current_password, &credentials.password_hash).await? {
            return Err(WaddleError::Authentication("current password is incorrect".to_string()));
        }

        let hash = hash_password(&request.new_password).await?;
        self.db.accounts.update_password(actor.role, actor.id, &hash).await?;

        log_account_action(actor.id, actor.role, "password_changed", None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token_roundtrip() {
        let tokens = TokenService::new(SECRET, 60);
        let actor = Actor::new(Uuid::new_v4(), Role::Vendor);

        let token = tokens.issue(actor).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.actor(), actor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_with_other_secret_is_rejected() {
        let issuer = TokenService::new(SECRET, 60);
        let verifier = TokenService::new("another-secret-another-secret-xx", 60);
        let token = issuer.issue(Actor::new(Uuid::new_v4(), Role::User)).unwrap();

        assert_matches!(verifier.verify(&token), Err(WaddleError::Token(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = TokenService::new(SECRET, -5);
        let token = tokens.issue(Actor::new(Uuid::new_v4(), Role::Admin)).unwrap();

        assert_matches!(tokens.verify(&token), Err(WaddleError::Token(_)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = TokenService::new(SECRET, 60);
        assert!(tokens.verify("not.a.token").is_err());
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).await.unwrap());
        assert!(!verify_password("wrong password", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        assert_matches!(
            verify_password("whatever", "plain-text").await,
            Err(WaddleError::PasswordHash(_))
        );
    }

    #[test]
    fn test_reset_key_is_scoped_by_role() {
        assert_eq!(
            AuthService::reset_key(Role::Vendor, "a@b.com"),
            "password_reset:vendor:a@b.com"
        );
    }
}
