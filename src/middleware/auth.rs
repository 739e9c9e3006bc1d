//! Authentication extractors
//!
//! Handlers declare the roles they accept through the extractor type:
//!
//! - [`AnyAuth`]: any signed-in account
//! - [`UserAuth`], [`AdminAuth`]: a single role
//! - [`ProviderAuth`]: vendors and organisers
//! - [`ProviderOrAdminAuth`]: vendors, organisers and admins
//! - [`MaybeAuth`]: public routes that behave differently for owners
//!
//! A missing or invalid token is rejected with 401 and a valid token of the
//! wrong role with 403. The role check runs before the account lookup, so a
//! forbidden role never reaches the database.

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::models::{Actor, Role};
use crate::state::AppState;
use crate::utils::errors::WaddleError;

/// Roles accepted by an [`Authenticated`] extractor
pub trait RolePolicy: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

#[derive(Debug, Clone, Copy)]
pub struct AnyRole;
#[derive(Debug, Clone, Copy)]
pub struct UserRole;
#[derive(Debug, Clone, Copy)]
pub struct ProviderRole;
#[derive(Debug, Clone, Copy)]
pub struct AdminRole;
#[derive(Debug, Clone, Copy)]
pub struct ProviderOrAdminRole;

impl RolePolicy for AnyRole {
    const ROLES: &'static [Role] = &[Role::User, Role::Vendor, Role::Organiser, Role::Admin];
}

impl RolePolicy for UserRole {
    const ROLES: &'static [Role] = &[Role::User];
}

impl RolePolicy for ProviderRole {
    const ROLES: &'static [Role] = &[Role::Vendor, Role::Organiser];
}

impl RolePolicy for AdminRole {
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl RolePolicy for ProviderOrAdminRole {
    const ROLES: &'static [Role] = &[Role::Vendor, Role::Organiser, Role::Admin];
}

/// Bearer token from the `Authorization` header, if present
fn bearer_token(parts: &Parts) -> Result<Option<&str>, WaddleError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| WaddleError::Authentication("invalid authorization header".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| WaddleError::Authentication("expected 'Bearer <token>'".to_string()))?;
    Ok(Some(token))
}

/// Verify a token and the account behind it
async fn authenticate(state: &AppState, token: &str, allowed: &[Role]) -> Result<Actor, WaddleError> {
    let claims = state.services.auth_service.tokens().verify(token)?;
    let actor = claims.actor();

    if !allowed.contains(&actor.role) {
        debug!(account_id = %actor.id, role = %actor.role, "Role not allowed for route");
        return Err(WaddleError::PermissionDenied(format!(
            "this endpoint is not available to {} accounts",
            actor.role
        )));
    }

    let account = state.services.db.accounts.state(actor.role, actor.id).await?;
    match account {
        None => Err(WaddleError::Authentication("account no longer exists".to_string())),
        Some(account) if account.is_deleted => {
            Err(WaddleError::Authentication("account no longer exists".to_string()))
        }
        Some(account) if account.is_banned => {
            warn!(account_id = %actor.id, role = %actor.role, "Banned account attempted access");
            Err(WaddleError::PermissionDenied("account is banned".to_string()))
        }
        Some(_) => Ok(actor),
    }
}

/// An authenticated caller whose role satisfies `P`
#[derive(Debug, Clone, Copy)]
pub struct Authenticated<P: RolePolicy = AnyRole> {
    pub actor: Actor,
    _policy: PhantomData<P>,
}

impl<P: RolePolicy> Authenticated<P> {
    pub fn actor(&self) -> Actor {
        self.actor
    }
}

pub type AnyAuth = Authenticated<AnyRole>;
pub type UserAuth = Authenticated<UserRole>;
pub type ProviderAuth = Authenticated<ProviderRole>;
pub type AdminAuth = Authenticated<AdminRole>;
pub type ProviderOrAdminAuth = Authenticated<ProviderOrAdminRole>;

#[async_trait]
impl<P: RolePolicy> FromRequestParts<AppState> for Authenticated<P> {
    type Rejection = WaddleError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| WaddleError::Authentication("missing bearer token".to_string()))?;
        let actor = authenticate(state, token, P::ROLES).await?;
        Ok(Self {
            actor,
            _policy: PhantomData,
        })
    }
}

/// Optional authentication: no header means anonymous, a bad header is 401
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuth(pub Option<Actor>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = WaddleError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(Self(Some(authenticate(state, token, AnyRole::ROLES).await?))),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(None)).unwrap(), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))).unwrap(), Some("abc.def"));
        assert!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_err());
    }

    #[test]
    fn test_policies() {
        assert!(ProviderRole::ROLES.contains(&Role::Vendor));
        assert!(ProviderRole::ROLES.contains(&Role::Organiser));
        assert!(!ProviderRole::ROLES.contains(&Role::Admin));
        assert!(!UserRole::ROLES.contains(&Role::Vendor));
        assert_eq!(AnyRole::ROLES.len(), 4);
    }
}
