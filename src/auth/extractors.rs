use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    claims::{Role, Subject},
    jwt::JwtKeys,
};
use crate::error::{AppError, AuthError};

/// Pulls the bearer token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// First gate stage: a request either carries a valid token or is rejected.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Subject, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
    keys.verify(token)
}

/// Second gate stage, for role-restricted operations.
pub fn require_role(subject: &Subject, role: Role) -> Result<(), AuthError> {
    if subject.role == role {
        Ok(())
    } else {
        warn!(user_id = %subject.user_id, required = %role, actual = %subject.role, "role check failed");
        Err(AuthError::Forbidden)
    }
}

/// Verified caller. The subject is also stored in the request extensions.
pub struct AuthUser(pub Subject);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let subject = authenticate(&parts.headers, &keys)?;
        parts.extensions.insert(subject.clone());
        Ok(AuthUser(subject))
    }
}

/// Verified caller holding the admin role.
pub struct AdminUser(pub Subject);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(subject) = AuthUser::from_request_parts(parts, state).await?;
        require_role(&subject, Role::Admin)?;
        Ok(AdminUser(subject))
    }
}
