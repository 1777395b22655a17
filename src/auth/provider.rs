//! Identity provider backed by the `users` table and locally signed tokens.
//!
//! One instance holds at most one session, the way a client-side auth
//! library does. Sign-in, sign-up and sign-out update that session and
//! broadcast the matching [`AuthEvent`], which is what drives a resolver
//! spawned over this provider.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::password::{hash_password, password_matches};
use super::repo_types::{NewUser, User};
use super::tokens::{SessionKeys, TokenKind};
use crate::session::identity::{
    AuthError, AuthEvent, IdentityProvider, Session, SignUpAttributes, SignUpOutcome, UserMetadata,
};
use crate::store::StoreError;
use crate::validation::is_valid_email;

/// Provider name stored on identities that sign in with a password.
pub const PASSWORD_PROVIDER: &str = "email";

const MIN_PASSWORD_LEN: usize = 8;

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create(&self, new: &NewUser) -> Result<User, StoreError>;
}

pub struct LocalIdentityProvider<D> {
    directory: D,
    keys: SessionKeys,
    oauth_authorize_url: Option<String>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl<D: UserDirectory> LocalIdentityProvider<D> {
    pub fn new(directory: D, keys: SessionKeys) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            directory,
            keys,
            oauth_authorize_url: None,
            session: Mutex::new(None),
            events,
        }
    }

    /// Enables redirect sign-in through the given authorization endpoint.
    pub fn with_oauth_authorize_url(mut self, url: Option<String>) -> Self {
        self.oauth_authorize_url = url;
        self
    }

    fn current(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers just means no resolver is attached yet.
        let _ = self.events.send(event);
    }

    async fn user(&self, id: Uuid) -> Result<User, AuthError> {
        self.directory
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .ok_or(AuthError::InvalidToken)
    }

    fn open(&self, user: &User) -> Result<Session, AuthError> {
        let session = self.keys.open_session(user.identity()).map_err(|e| {
            error!(user_id = %user.id, error = %e, "could not issue session tokens");
            AuthError::Provider(e.to_string())
        })?;
        *self.current() = Some(session.clone());
        Ok(session)
    }

    /// Adopts the session an access token stands for without announcing it,
    /// as a restored session would be on start-up.
    pub async fn resume(&self, access_token: &str) -> Result<Session, AuthError> {
        let claims = self
            .keys
            .verify(access_token, TokenKind::Access)
            .map_err(|_| AuthError::InvalidToken)?;
        let user = self.user(claims.sub).await?;
        let session = Session {
            user: user.identity(),
            access_token: access_token.to_owned(),
            refresh_token: None,
            provider_token: None,
            expires_at: OffsetDateTime::from_unix_timestamp(claims.exp).ok(),
        };
        *self.current() = Some(session.clone());
        Ok(session)
    }

    /// Trades a refresh token for a new pair and emits `TokenRefreshed`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let claims = self
            .keys
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::InvalidToken)?;
        let user = self.user(claims.sub).await?;
        let session = self.open(&user)?;
        self.publish(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }
}

fn store_failure(e: StoreError) -> AuthError {
    match e {
        StoreError::Unavailable(msg) => AuthError::Network(msg),
        StoreError::UniqueViolation { .. } => AuthError::AlreadyRegistered,
        other => {
            error!(error = %other, code = other.code(), "user directory failed");
            AuthError::Provider(other.to_string())
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Sign-up attributes kept on the identity. No profile rows are created here.
pub fn signup_metadata(attributes: SignUpAttributes) -> UserMetadata {
    let mut metadata = UserMetadata {
        name: attributes.name.filter(|n| !n.trim().is_empty()),
        ..Default::default()
    };
    for (key, value) in [("company", attributes.company), ("website", attributes.website)] {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            metadata.extra.insert(key.into(), v.into());
        }
    }
    metadata
}

#[async_trait]
impl<D: UserDirectory> IdentityProvider for LocalIdentityProvider<D> {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current().clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: SignUpAttributes,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidInput("Invalid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        if self
            .directory
            .find_by_email(&email)
            .await
            .map_err(store_failure)?
            .is_some()
        {
            warn!(%email, "sign-up for a registered email");
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = hash_password(password).map_err(|e| {
            error!(error = %e, "password hashing failed");
            AuthError::Provider(e.to_string())
        })?;
        let user = self
            .directory
            .create(&NewUser {
                email,
                password_hash,
                provider: PASSWORD_PROVIDER.into(),
                metadata: signup_metadata(attributes),
            })
            .await
            .map_err(store_failure)?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        let session = self.open(&user)?;
        self.publish(AuthEvent::SignedIn(session));
        Ok(SignUpOutcome::SignedIn)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let user = match self.directory.find_by_email(&email).await.map_err(store_failure)? {
            Some(u) if u.provider == PASSWORD_PROVIDER => u,
            Some(u) => {
                warn!(user_id = %u.id, provider = %u.provider, "password sign-in for a non-password identity");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                warn!(%email, "sign-in for an unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !password_matches(password, &user.password_hash) {
            warn!(user_id = %user.id, "sign-in with a wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user signed in");
        let session = self.open(&user)?;
        self.publish(AuthEvent::SignedIn(session));
        Ok(())
    }

    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, AuthError> {
        let base = self
            .oauth_authorize_url
            .as_deref()
            .ok_or_else(|| AuthError::Provider("OAuth sign-in is not configured".into()))?;
        let mut url = format!("{base}?provider={provider}");
        if let Some(to) = redirect_to {
            url.push_str("&redirect_to=");
            url.push_str(to);
        }
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(previous) = self.current().take() {
            info!(user_id = %previous.user.id, "user signed out");
        }
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
