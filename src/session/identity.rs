//! Identity-provider seam: the session shape, the events it emits and the
//! operations the resolver delegates to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Free-form profile metadata the provider attaches to an identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserMetadata {
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.full_name.as_deref()).or_else(|| non_blank(self.name.as_deref()))
    }

    pub fn handle(&self) -> Option<&str> {
        non_blank(self.user_name.as_deref())
            .or_else(|| non_blank(self.preferred_username.as_deref()))
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// The signed-in user as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    /// Provider that authenticated this identity, e.g. `"github"` or `"email"`.
    pub provider: String,
    #[serde(default)]
    pub metadata: UserMetadata,
}

impl Identity {
    pub fn contact_email(&self) -> Option<&str> {
        non_blank(self.email.as_deref()).or_else(|| non_blank(self.metadata.email.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token issued by the upstream OAuth provider, when there is one.
    #[serde(default)]
    pub provider_token: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
    UserUpdated(Session),
    TokenRefreshed(Session),
    Other {
        kind: String,
        session: Option<Session>,
    },
}

impl AuthEvent {
    pub fn kind(&self) -> &str {
        match self {
            AuthEvent::InitialSession(_) => "INITIAL_SESSION",
            AuthEvent::SignedIn(_) => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::UserUpdated(_) => "USER_UPDATED",
            AuthEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
            AuthEvent::Other { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered")]
    AlreadyRegistered,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Provider(String),
    #[error("session resolver has stopped")]
    ResolverStopped,
}

/// Extra attributes stored on the identity at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignUpAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider opened a session and will emit `SignedIn`.
    SignedIn,
    /// The account exists but must be confirmed by email first; no event follows.
    ConfirmationRequired,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: SignUpAttributes,
    ) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Starts a redirect-based sign-in and returns the URL to send the browser to.
    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
