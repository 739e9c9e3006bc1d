//! Authentication payloads

use serde::{Deserialize, Serialize};

use super::{Role, Validate};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::{is_valid_email, optional_text, require_text, validate_password};

fn check_email(email: &str) -> Result<()> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(WaddleError::Validation("email is invalid".to_string()))
    }
}

/// Self-service registration for parents, vendors and organisers
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub role: Role,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    // user
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    // vendor
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    // organiser
    pub name: Option<String>,
    pub organisation_name: Option<String>,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<()> {
        check_email(&self.email)?;
        validate_password(&self.password)?;
        optional_text("phone", self.phone.as_deref(), 32)?;

        match self.role {
            Role::User => {
                require_text("first_name", self.first_name.as_deref().unwrap_or_default(), 100)?;
                require_text("last_name", self.last_name.as_deref().unwrap_or_default(), 100)?;
            }
            Role::Vendor => {
                require_text("business_name", self.business_name.as_deref().unwrap_or_default(), 200)?;
                optional_text("contact_name", self.contact_name.as_deref(), 200)?;
            }
            Role::Organiser => {
                require_text("name", self.name.as_deref().unwrap_or_default(), 200)?;
                optional_text("organisation_name", self.organisation_name.as_deref(), 200)?;
            }
            Role::Admin => {
                return Err(WaddleError::Validation(
                    "admin accounts cannot be created by signup".to_string(),
                ))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub role: Role,
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        check_email(&self.email)?;
        if self.password.is_empty() {
            return Err(WaddleError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub role: Role,
    pub email: String,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<()> {
        check_email(&self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub role: Role,
    pub email: String,
    pub code: String,
    pub new_password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<()> {
        check_email(&self.email)?;
        if self.code.len() != 6 || !self.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(WaddleError::Validation("code must be 6 digits".to_string()));
        }
        validate_password(&self.new_password)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<()> {
        if self.current_password.is_empty() {
            return Err(WaddleError::Validation("current_password is required".to_string()));
        }
        validate_password(&self.new_password)?;
        if self.current_password == self.new_password {
            return Err(WaddleError::Validation(
                "new_password must differ from current_password".to_string(),
            ));
        }
        Ok(())
    }
}

/// Token plus the account it was issued for
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub role: Role,
    pub account: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(role: Role) -> SignupRequest {
        SignupRequest {
            role,
            email: "someone@example.com".into(),
            password: "password123".into(),
            phone: None,
            first_name: None,
            last_name: None,
            business_name: None,
            contact_name: None,
            name: None,
            organisation_name: None,
        }
    }

    #[test]
    fn test_signup_requires_role_fields() {
        let mut req = signup(Role::User);
        assert!(req.validate().is_err());
        req.first_name = Some("Pat".into());
        req.last_name = Some("Parent".into());
        assert!(req.validate().is_ok());

        let mut req = signup(Role::Vendor);
        assert!(req.validate().is_err());
        req.business_name = Some("Little Splashers".into());
        assert!(req.validate().is_ok());

        let mut req = signup(Role::Organiser);
        req.name = Some("Olive".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_rejects_admin_and_bad_input() {
        assert!(signup(Role::Admin).validate().is_err());

        let mut req = signup(Role::Organiser);
        req.name = Some("Olive".into());
        req.password = "short".into();
        assert!(req.validate().is_err());

        req.password = "password123".into();
        req.email = "nope".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_reset_code_shape() {
        let mut req = ResetPasswordRequest {
            role: Role::User,
            email: "a@example.com".into(),
            code: "12345".into(),
            new_password: "newpassword".into(),
        };
        assert!(req.validate().is_err());
        req.code = "123456".into();
        assert!(req.validate().is_ok());
        req.code = "12a456".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_change_password_must_differ() {
        let req = ChangePasswordRequest {
            current_password: "password123".into(),
            new_password: "password123".into(),
        };
        assert!(req.validate().is_err());
    }
}
