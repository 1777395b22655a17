use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::tokens::{SessionKeys, TokenError, TokenKind};

type Rejection = (StatusCode, String);

fn bearer(parts: &Parts) -> Result<&str, Rejection> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))
}

/// The raw bearer token, unverified; for handlers that hand it to the provider.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer(parts).map(|t| BearerToken(t.to_owned()))
    }
}

/// Extracts and validates the bearer access token, returning the user ID.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?;
        let claims = SessionKeys::from_ref(state)
            .verify(token, TokenKind::Access)
            .map_err(|e| {
                if let TokenError::Invalid(cause) = &e {
                    warn!(error = %cause, "rejected bearer token");
                }
                (StatusCode::UNAUTHORIZED, e.to_string())
            })?;

        Ok(AuthUser(claims.sub))
    }
}
