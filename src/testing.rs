//! In-memory stand-ins for the identity provider and the profile store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{broadcast, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::auth::provider::UserDirectory;
use crate::auth::repo_types::{NewUser, User};
use crate::auth::tokens::SessionKeys;
use crate::builders::repo_types::{BuilderProfile, NewBuilder};
use crate::config::JwtConfig;
use crate::session::identity::{
    AuthError, AuthEvent, Identity, IdentityProvider, Session, SignUpAttributes, SignUpOutcome,
    UserMetadata,
};
use crate::sponsors::repo_types::{NewSponsor, SponsorProfile};
use crate::store::{ProfileStore, StoreError};

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 5,
        refresh_ttl_minutes: 60,
    }
}

pub fn session_keys() -> SessionKeys {
    SessionKeys::new(&jwt_config())
}

pub fn github_identity(email: &str, handle: Option<&str>) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: Some(email.to_owned()),
        provider: "github".into(),
        metadata: UserMetadata {
            user_name: handle.map(str::to_owned),
            avatar_url: handle.map(|h| format!("https://avatars.example.test/{h}.png")),
            ..Default::default()
        },
    }
}

pub fn password_identity(email: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: Some(email.to_owned()),
        provider: "email".into(),
        metadata: UserMetadata::default(),
    }
}

pub fn session_for(identity: &Identity) -> Session {
    Session {
        user: identity.clone(),
        access_token: format!("access-{}", identity.id),
        refresh_token: Some(format!("refresh-{}", identity.id)),
        provider_token: None,
        expires_at: None,
    }
}

pub fn sponsor_row(user_id: Uuid, email: &str, name: &str) -> SponsorProfile {
    SponsorProfile {
        id: Uuid::new_v4(),
        user_id,
        email: email.to_owned(),
        name: name.to_owned(),
        company: None,
        website: None,
        notify_new_submissions: Some(true),
        notify_deadlines: Some(true),
        notify_candidate_updates: Some(true),
        created_at: Some(OffsetDateTime::now_utc()),
        updated_at: Some(OffsetDateTime::now_utc()),
    }
}

pub fn builder_row(identity: &Identity, name: &str) -> BuilderProfile {
    BuilderProfile {
        id: identity.id,
        email: identity.email.clone().unwrap_or_default(),
        name: name.to_owned(),
        github_handle: None,
        github_url: None,
        avatar_url: None,
        linkedin_url: None,
        website_url: None,
        created_at: Some(OffsetDateTime::now_utc()),
        updated_at: None,
    }
}

pub fn user_row(identity: &Identity, password_hash: &str) -> User {
    User {
        id: identity.id,
        email: identity.email.clone().unwrap_or_default(),
        password_hash: password_hash.to_owned(),
        provider: identity.provider.clone(),
        metadata: sqlx::types::Json(identity.metadata.clone()),
        created_at: OffsetDateTime::now_utc(),
    }
}

fn duplicate(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: Some(constraint.to_owned()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

#[derive(Default)]
struct StoreInner {
    builders: HashMap<Uuid, BuilderProfile>,
    sponsors: Vec<SponsorProfile>,
    builder_inserts: usize,
    sponsor_lookups: usize,
    fail_builder_lookups: bool,
    fail_sponsor_lookups: bool,
    fail_builder_inserts: bool,
    last_sponsor_insert: Option<NewSponsor>,
}

/// Profile store backed by maps, with counters and failure switches.
#[derive(Default)]
pub struct MemoryProfileStore {
    inner: Mutex<StoreInner>,
    sponsor_gate: Arc<RwLock<()>>,
    sponsor_insert_gate: Arc<RwLock<()>>,
}

impl MemoryProfileStore {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap()
    }

    pub fn builder_count(&self) -> usize {
        self.lock().builders.len()
    }

    pub fn builder_inserts(&self) -> usize {
        self.lock().builder_inserts
    }

    pub fn builder(&self, id: Uuid) -> Option<BuilderProfile> {
        self.lock().builders.get(&id).cloned()
    }

    pub fn sponsor_lookups(&self) -> usize {
        self.lock().sponsor_lookups
    }

    pub fn last_sponsor_insert(&self) -> Option<NewSponsor> {
        self.lock().last_sponsor_insert.clone()
    }

    pub fn fail_builder_lookups(&self, fail: bool) {
        self.lock().fail_builder_lookups = fail;
    }

    pub fn fail_sponsor_lookups(&self, fail: bool) {
        self.lock().fail_sponsor_lookups = fail;
    }

    pub fn fail_builder_inserts(&self, fail: bool) {
        self.lock().fail_builder_inserts = fail;
    }

    pub fn add_builder(&self, profile: BuilderProfile) {
        self.lock().builders.insert(profile.id, profile);
    }

    pub fn add_sponsor(&self, profile: SponsorProfile) {
        self.lock().sponsors.push(profile);
    }

    /// Sponsor lookups block until the returned guard is dropped.
    pub async fn hold_sponsor_lookups(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.sponsor_gate).write_owned().await
    }

    /// Sponsor inserts are recorded, then block until the guard is dropped.
    pub async fn hold_sponsor_inserts(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.sponsor_insert_gate).write_owned().await
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_builder(&self, id: Uuid) -> Result<Option<BuilderProfile>, StoreError> {
        let inner = self.lock();
        if inner.fail_builder_lookups {
            return Err(StoreError::Unavailable("builders unreachable".into()));
        }
        Ok(inner.builders.get(&id).cloned())
    }

    async fn insert_builder(&self, new: &NewBuilder) -> Result<BuilderProfile, StoreError> {
        let mut inner = self.lock();
        if inner.fail_builder_inserts {
            return Err(StoreError::Unavailable("builders unreachable".into()));
        }
        if inner.builders.contains_key(&new.id) {
            return Err(duplicate("builders_pkey"));
        }
        let now = OffsetDateTime::now_utc();
        let profile = BuilderProfile {
            id: new.id,
            email: new.email.clone(),
            name: new.name.clone(),
            github_handle: new.github_handle.clone(),
            github_url: new.github_url.clone(),
            avatar_url: new.avatar_url.clone(),
            linkedin_url: None,
            website_url: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        inner.builder_inserts += 1;
        inner.builders.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn find_sponsor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SponsorProfile>, StoreError> {
        self.lock().sponsor_lookups += 1;
        let _pass = self.sponsor_gate.read().await;
        let inner = self.lock();
        if inner.fail_sponsor_lookups {
            return Err(StoreError::Unavailable("sponsors unreachable".into()));
        }
        Ok(inner.sponsors.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn insert_sponsor(&self, new: &NewSponsor) -> Result<SponsorProfile, StoreError> {
        self.lock().last_sponsor_insert = Some(new.clone());
        let _pass = self.sponsor_insert_gate.read().await;
        let mut inner = self.lock();
        if inner.sponsors.iter().any(|s| s.email == new.email) {
            return Err(duplicate("sponsors_email_key"));
        }
        if inner.sponsors.iter().any(|s| s.user_id == new.user_id) {
            return Err(duplicate("sponsors_user_id_key"));
        }
        let mut profile = sponsor_row(new.user_id, &new.email, &new.name);
        profile.company = new.company.clone();
        profile.website = new.website.clone();
        inner.sponsors.push(profile.clone());
        Ok(profile)
    }
}

/// User directory kept in a vector, with the `users_email_key` constraint.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn add(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(duplicate("users_email_key"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            provider: new.provider.clone(),
            metadata: sqlx::types::Json(new.metadata.clone()),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
struct ProviderInner {
    session: Option<Session>,
    accounts: HashMap<String, (String, Identity)>,
    sign_up_outcome: Option<SignUpOutcome>,
    get_session_calls: usize,
}

/// Identity provider that keeps accounts in memory and emits events on demand.
pub struct FakeIdentityProvider {
    events: broadcast::Sender<AuthEvent>,
    inner: Mutex<ProviderInner>,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl FakeIdentityProvider {
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            events,
            inner: Mutex::new(ProviderInner::default()),
        }
    }

    pub fn with_session(self, session: Session) -> Self {
        self.lock().session = Some(session);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ProviderInner> {
        self.inner.lock().unwrap()
    }

    pub fn add_account(&self, password: &str, identity: &Identity) {
        let email = identity.email.clone().unwrap_or_default();
        self.lock()
            .accounts
            .insert(email, (password.to_owned(), identity.clone()));
    }

    pub fn set_sign_up_outcome(&self, outcome: SignUpOutcome) {
        self.lock().sign_up_outcome = Some(outcome);
    }

    pub fn get_session_calls(&self) -> usize {
        self.lock().get_session_calls
    }

    /// Updates the stored session the way the event implies, then broadcasts it.
    pub fn emit(&self, event: AuthEvent) {
        {
            let mut inner = self.lock();
            match &event {
                AuthEvent::SignedIn(s) | AuthEvent::UserUpdated(s) | AuthEvent::TokenRefreshed(s) => {
                    inner.session = Some(s.clone());
                }
                AuthEvent::SignedOut => inner.session = None,
                AuthEvent::InitialSession(_) | AuthEvent::Other { .. } => {}
            }
        }
        let _ = self.events.send(event);
    }

    pub fn sign_in(&self, identity: &Identity) {
        self.emit(AuthEvent::SignedIn(session_for(identity)));
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let mut inner = self.lock();
        inner.get_session_calls += 1;
        Ok(inner.session.clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: SignUpAttributes,
    ) -> Result<SignUpOutcome, AuthError> {
        let mut identity = password_identity(email);
        identity.metadata.name = attributes.name;
        let outcome = {
            let mut inner = self.lock();
            if inner.accounts.contains_key(email) {
                return Err(AuthError::AlreadyRegistered);
            }
            inner
                .accounts
                .insert(email.to_owned(), (password.to_owned(), identity.clone()));
            inner
                .sign_up_outcome
                .unwrap_or(SignUpOutcome::ConfirmationRequired)
        };
        if outcome == SignUpOutcome::SignedIn {
            self.sign_in(&identity);
        }
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let identity = match self.lock().accounts.get(email) {
            Some((expected, identity)) if expected == password => identity.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        self.sign_in(&identity);
        Ok(())
    }

    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, AuthError> {
        let mut url = format!("https://auth.example.test/authorize?provider={provider}");
        if let Some(to) = redirect_to {
            url.push_str("&redirect_to=");
            url.push_str(to);
        }
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
