//! Access and refresh tokens for sessions opened by this service.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::session::identity::{Identity, Session};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload; `sub` is the identity id shared with builder rows and sponsor links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("Invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("{expected:?} token required")]
    WrongKind { expected: TokenKind },
}

/// Signing material plus the issuer, audience and lifetimes every token carries.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_audience(&[&cfg.audience]);
        validation.set_issuer(&[&cfg.issuer]);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::minutes(cfg.ttl_minutes.max(1)),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes.max(1)),
        }
    }

    fn sign(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        issued_at: OffsetDateTime,
    ) -> Result<(String, OffsetDateTime), TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = issued_at + ttl;
        let claims = Claims {
            sub: user_id,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Sign)?;
        Ok((token, expires_at))
    }

    /// A session for `user` with a fresh access/refresh pair. `expires_at` is
    /// the access token's expiry.
    pub fn open_session(&self, user: Identity) -> Result<Session, TokenError> {
        let now = OffsetDateTime::now_utc();
        let (access_token, expires_at) = self.sign(user.id, TokenKind::Access, now)?;
        let (refresh_token, _) = self.sign(user.id, TokenKind::Refresh, now)?;
        debug!(user_id = %user.id, "session tokens issued");
        Ok(Session {
            user,
            access_token,
            refresh_token: Some(refresh_token),
            provider_token: None,
            expires_at: Some(expires_at),
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(TokenError::Invalid)?
            .claims;
        if claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(claims)
    }
}
