//! The resolver actor.
//!
//! One task owns the auth state and is its only writer. It reacts to three
//! inputs: commands from [`AuthHandle`]s, provider events, and completions of
//! the work it spawned (session lookups, profile lookups, provider calls).
//! Every profile lookup is tagged with the identity epoch and a request
//! sequence number; a completion is applied only while both are still the
//! latest for that profile, so a slow lookup for a previous identity can
//! never overwrite newer state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::ResolverConfig;
use super::effects::{Effect, Notice};
use super::handle::{AuthHandle, RefreshStatus};
use super::identity::{
    AuthError, AuthEvent, Identity, IdentityProvider, Session, SignUpAttributes, SignUpOutcome,
};
use super::snapshot::{AuthSnapshot, Phase};
use crate::builders::services::{ensure_builder, ProvisionError, Provisioned};
use crate::sponsors::dto::SponsorRegistration;
use crate::sponsors::repo_types::SponsorProfile;
use crate::sponsors::services::{register_sponsor, RegistrationError};
use crate::store::{found, ProfileStore, StoreError};

pub(super) enum Command {
    SignInWithPassword {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<(), AuthError>>,
    },
    SignUp {
        email: String,
        password: String,
        attributes: SignUpAttributes,
        reply: oneshot::Sender<Result<SignUpOutcome, AuthError>>,
    },
    SignInWithOAuth {
        reply: oneshot::Sender<Result<(), AuthError>>,
    },
    SignOut {
        reply: oneshot::Sender<Result<(), AuthError>>,
    },
    RefreshSponsor {
        reply: oneshot::Sender<RefreshStatus>,
    },
    RefreshBuilder {
        reply: oneshot::Sender<RefreshStatus>,
    },
    SetReturnTo(Option<String>),
    RegisterSponsor {
        form: SponsorRegistration,
        reply: oneshot::Sender<Result<SponsorProfile, RegistrationError>>,
    },
}

/// Identifies one profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tag {
    epoch: u64,
    seq: u64,
    user_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
enum AuthOp {
    SignIn,
    SignUp,
    OAuth,
    SignOut,
}

impl AuthOp {
    fn as_str(self) -> &'static str {
        match self {
            AuthOp::SignIn => "sign_in",
            AuthOp::SignUp => "sign_up",
            AuthOp::OAuth => "oauth",
            AuthOp::SignOut => "sign_out",
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            AuthOp::SignIn | AuthOp::OAuth => "Login failed",
            AuthOp::SignUp => "Registration failed",
            AuthOp::SignOut => "Sign out failed",
        }
    }
}

#[derive(Debug)]
enum AuthOpOutcome {
    /// The provider will follow up with an event.
    AwaitEvent,
    ConfirmationRequired,
    Redirect(String),
}

enum Completion {
    Session {
        seq: u64,
        result: Result<Option<Session>, AuthError>,
    },
    Sponsor {
        tag: Tag,
        result: Result<Option<SponsorProfile>, StoreError>,
    },
    Builder {
        tag: Tag,
        result: Result<Option<Provisioned>, ProvisionError>,
    },
    AuthOp {
        op: AuthOp,
        result: Result<AuthOpOutcome, AuthError>,
    },
    Registered {
        epoch: u64,
        user_id: Uuid,
        result: Result<(), String>,
    },
}

/// Starts the resolver on the current tokio runtime.
///
/// The returned receiver carries the notifications and navigations the host
/// should perform; dropping it simply discards them.
pub fn spawn<P, S>(
    provider: Arc<P>,
    store: Arc<S>,
    config: ResolverConfig,
) -> (AuthHandle, mpsc::UnboundedReceiver<Effect>)
where
    P: IdentityProvider,
    S: ProfileStore,
{
    let (snapshot_tx, snapshot_rx) = watch::channel(AuthSnapshot::default());
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (effect_tx, effect_rx) = mpsc::unbounded_channel();
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let events = provider.subscribe();

    let resolver = SessionResolver {
        provider,
        store,
        config,
        state: AuthSnapshot::default(),
        epoch: 0,
        next_seq: 0,
        session_seq: 0,
        sponsor_pending: None,
        builder_pending: None,
        navigate_when_resolved: false,
        return_to: None,
        snapshots: snapshot_tx,
        effects: effect_tx,
        completions: completion_tx,
    };
    tokio::spawn(resolver.run(command_rx, completion_rx, events));

    (AuthHandle::new(command_tx, snapshot_rx), effect_rx)
}

struct SessionResolver<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    config: ResolverConfig,
    state: AuthSnapshot,
    /// Bumped whenever the identity changes or is re-resolved.
    epoch: u64,
    next_seq: u64,
    /// Bumped by every event and session lookup; only the latest lookup may apply.
    session_seq: u64,
    sponsor_pending: Option<u64>,
    builder_pending: Option<u64>,
    navigate_when_resolved: bool,
    return_to: Option<String>,
    snapshots: watch::Sender<AuthSnapshot>,
    effects: mpsc::UnboundedSender<Effect>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl<P, S> SessionResolver<P, S>
where
    P: IdentityProvider,
    S: ProfileStore,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) {
        self.lookup_session();
        self.publish();

        let mut events_open = true;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                Some(done) = completions.recv() => self.on_completion(done),
                event = events.recv(), if events_open => match event {
                    Ok(event) => self.on_event(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "auth events dropped; re-reading session");
                        self.lookup_session();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("identity provider closed its event stream");
                        events_open = false;
                    }
                },
            }
            self.publish();
        }
        debug!("session resolver stopped");
    }

    fn publish(&self) {
        self.snapshots.send_if_modified(|current| {
            if *current == self.state {
                return false;
            }
            *current = self.state.clone();
            true
        });
    }

    fn effect(&self, effect: Effect) {
        let _ = self.effects.send(effect);
    }

    fn notify(&self, notice: Notice) {
        self.effect(Effect::Notify(notice));
    }

    fn current_user(&self) -> Option<Uuid> {
        self.state.user().map(|u| u.id)
    }

    fn is_current(&self, tag: Tag, pending: Option<u64>) -> bool {
        tag.epoch == self.epoch
            && pending == Some(tag.seq)
            && self.current_user() == Some(tag.user_id)
    }

    fn tag(&mut self, user_id: Uuid) -> Tag {
        self.next_seq += 1;
        Tag {
            epoch: self.epoch,
            seq: self.next_seq,
            user_id,
        }
    }

    fn sync_profile_flag(&mut self) {
        self.state.is_loading_profiles =
            self.sponsor_pending.is_some() || self.builder_pending.is_some();
    }

    fn lookup_session(&mut self) {
        self.session_seq += 1;
        let seq = self.session_seq;
        let provider = Arc::clone(&self.provider);
        let done = self.completions.clone();
        tokio::spawn(async move {
            let result = provider.get_session().await;
            let _ = done.send(Completion::Session { seq, result });
        });
    }

    /// Adopts a session seen outside an explicit sign-in.
    fn observe(&mut self, session: Option<Session>) {
        match session {
            None => {
                if self.state.session.is_some() {
                    self.clear(Phase::Anonymous);
                } else if self.state.phase == Phase::ResolvingSession {
                    self.state.phase = Phase::Resolved;
                }
                self.state.is_loading = false;
            }
            Some(session) if self.current_user() == Some(session.user.id) => {
                self.state.session = Some(session);
                self.state.is_loading = false;
            }
            Some(session) => self.resolve(session, false),
        }
    }

    /// Installs `session` and looks both profiles up again.
    fn resolve(&mut self, session: Session, navigate: bool) {
        let same_user = self.current_user() == Some(session.user.id);
        if !same_user {
            self.state.sponsor_profile = None;
            self.state.builder_profile = None;
        }
        self.epoch += 1;
        self.navigate_when_resolved = navigate || (same_user && self.navigate_when_resolved);

        let identity = session.user.clone();
        info!(user_id = %identity.id, provider = %identity.provider, epoch = self.epoch, "resolving profiles");
        self.state.session = Some(session);
        self.state.is_loading = false;
        self.state.phase = Phase::ResolvingProfiles;

        let provision = identity.provider == self.config.oauth_provider;
        self.spawn_sponsor_lookup(identity.id);
        self.spawn_builder_lookup(identity, provision);
        self.sync_profile_flag();
    }

    fn clear(&mut self, phase: Phase) {
        self.epoch += 1;
        self.sponsor_pending = None;
        self.builder_pending = None;
        self.navigate_when_resolved = false;
        self.state = AuthSnapshot {
            phase,
            session: None,
            sponsor_profile: None,
            builder_profile: None,
            is_loading: false,
            is_loading_profiles: false,
        };
    }

    fn spawn_sponsor_lookup(&mut self, user_id: Uuid) {
        let tag = self.tag(user_id);
        self.sponsor_pending = Some(tag.seq);
        let store = Arc::clone(&self.store);
        let done = self.completions.clone();
        tokio::spawn(async move {
            let result = found(store.find_sponsor_by_user(user_id).await);
            let _ = done.send(Completion::Sponsor { tag, result });
        });
    }

    fn spawn_builder_lookup(&mut self, identity: Identity, provision: bool) {
        let tag = self.tag(identity.id);
        self.builder_pending = Some(tag.seq);
        let store = Arc::clone(&self.store);
        let done = self.completions.clone();
        tokio::spawn(async move {
            let result = if provision {
                ensure_builder(store.as_ref(), &identity).await.map(Some)
            } else {
                found(store.find_builder(identity.id).await)
                    .map(|p| p.map(Provisioned::Existing))
                    .map_err(ProvisionError::Lookup)
            };
            let _ = done.send(Completion::Builder { tag, result });
        });
    }

    fn refresh_sponsor(&mut self) -> RefreshStatus {
        let Some(user_id) = self.current_user() else {
            return RefreshStatus::NoSession;
        };
        if self.sponsor_pending.is_some() {
            return RefreshStatus::AlreadyInFlight;
        }
        self.spawn_sponsor_lookup(user_id);
        self.sync_profile_flag();
        RefreshStatus::Started
    }

    fn refresh_builder(&mut self) -> RefreshStatus {
        let Some(identity) = self.state.user().cloned() else {
            return RefreshStatus::NoSession;
        };
        if self.builder_pending.is_some() {
            return RefreshStatus::AlreadyInFlight;
        }
        self.spawn_builder_lookup(identity, false);
        self.sync_profile_flag();
        RefreshStatus::Started
    }

    /// Finishes profile resolution once neither lookup is outstanding.
    fn after_lookup(&mut self) {
        self.sync_profile_flag();
        if self.state.is_loading_profiles || self.state.phase != Phase::ResolvingProfiles {
            return;
        }
        self.state.phase = Phase::Resolved;
        debug!(standing = ?self.state.standing(), "profiles resolved");

        if std::mem::take(&mut self.navigate_when_resolved) {
            let target = self.return_to.take().unwrap_or_else(|| {
                if self.state.is_sponsor() {
                    self.config.sponsor_landing.clone()
                } else {
                    self.config.builder_landing.clone()
                }
            });
            self.effect(Effect::Navigate(target));
        }
    }

    fn on_event(&mut self, event: AuthEvent) {
        debug!(kind = event.kind(), "auth event");
        self.session_seq += 1;
        match event {
            AuthEvent::InitialSession(session) => self.observe(session),
            AuthEvent::SignedIn(session) => {
                self.notify(Notice::success("Signed in successfully", "Welcome back!"));
                self.resolve(session, true);
            }
            AuthEvent::SignedOut => {
                info!(user_id = ?self.current_user(), "signed out");
                self.clear(Phase::Anonymous);
                self.notify(Notice::success("Signed out successfully", "Come back soon!"));
                self.effect(Effect::Navigate(self.config.public_landing.clone()));
            }
            AuthEvent::UserUpdated(session) => self.resolve(session, false),
            AuthEvent::TokenRefreshed(session) => self.observe(Some(session)),
            AuthEvent::Other {
                session: Some(session),
                ..
            } => self.observe(Some(session)),
            AuthEvent::Other { session: None, .. } => self.state.is_loading = false,
        }
    }

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Session { seq, result } => {
                if seq != self.session_seq {
                    debug!("superseded session lookup ignored");
                    return;
                }
                match result {
                    Ok(session) => self.observe(session),
                    Err(e) => {
                        warn!(error = %e, "session lookup failed");
                        if self.state.session.is_none() {
                            self.observe(None);
                        } else {
                            self.state.is_loading = false;
                        }
                    }
                }
            }
            Completion::Sponsor { tag, result } => {
                if !self.is_current(tag, self.sponsor_pending) {
                    debug!(user_id = %tag.user_id, epoch = tag.epoch, "stale sponsor lookup ignored");
                    return;
                }
                self.sponsor_pending = None;
                self.state.sponsor_profile = result.unwrap_or_else(|e| {
                    warn!(user_id = %tag.user_id, error = %e, code = e.code(), "sponsor lookup failed");
                    None
                });
                self.after_lookup();
            }
            Completion::Builder { tag, result } => {
                if !self.is_current(tag, self.builder_pending) {
                    debug!(user_id = %tag.user_id, epoch = tag.epoch, "stale builder lookup ignored");
                    return;
                }
                self.builder_pending = None;
                self.state.builder_profile = match result {
                    Ok(Some(Provisioned::Created(profile))) => {
                        self.notify(Notice::success(
                            "Profile created",
                            "Your builder profile has been set up.",
                        ));
                        Some(profile)
                    }
                    Ok(Some(Provisioned::Existing(profile))) => Some(profile),
                    Ok(None) => None,
                    Err(ProvisionError::Lookup(e)) => {
                        warn!(user_id = %tag.user_id, error = %e, code = e.code(), "builder lookup failed");
                        None
                    }
                    Err(e) => {
                        error!(user_id = %tag.user_id, error = %e, "builder provisioning failed");
                        self.notify(Notice::error("Profile creation failed", e.to_string()));
                        None
                    }
                };
                self.after_lookup();
            }
            Completion::AuthOp { op, result } => match result {
                Ok(AuthOpOutcome::AwaitEvent) => {}
                Ok(AuthOpOutcome::ConfirmationRequired) => {
                    self.state.is_loading = false;
                    self.notify(Notice::success(
                        "Registration successful",
                        "Please check your email for verification.",
                    ));
                }
                Ok(AuthOpOutcome::Redirect(url)) => {
                    self.state.is_loading = false;
                    self.effect(Effect::ExternalRedirect(url));
                }
                Err(e) => {
                    warn!(op = op.as_str(), error = %e, "auth operation failed");
                    self.state.is_loading = false;
                    self.notify(Notice::error(op.failure_title(), e.to_string()));
                }
            },
            Completion::Registered {
                epoch,
                user_id,
                result,
            } => {
                if epoch != self.epoch || self.current_user() != Some(user_id) {
                    debug!(%user_id, ok = result.is_ok(), "registration finished for a previous identity");
                    return;
                }
                match result {
                    Ok(()) => {
                        self.notify(Notice::success(
                            "Sponsor profile created",
                            "You can now post challenges.",
                        ));
                        // Any lookup already in flight predates the insert.
                        self.sponsor_pending = None;
                        self.refresh_sponsor();
                    }
                    Err(message) => self.notify(Notice::error("Registration failed", message)),
                }
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SignInWithPassword {
                email,
                password,
                reply,
            } => {
                self.state.is_loading = true;
                let provider = Arc::clone(&self.provider);
                let done = self.completions.clone();
                tokio::spawn(async move {
                    let result = provider.sign_in_with_password(&email, &password).await;
                    let _ = done.send(Completion::AuthOp {
                        op: AuthOp::SignIn,
                        result: result.clone().map(|()| AuthOpOutcome::AwaitEvent),
                    });
                    let _ = reply.send(result);
                });
            }
            Command::SignUp {
                email,
                password,
                attributes,
                reply,
            } => {
                self.state.is_loading = true;
                let provider = Arc::clone(&self.provider);
                let done = self.completions.clone();
                tokio::spawn(async move {
                    let result = provider.sign_up(&email, &password, attributes).await;
                    let _ = done.send(Completion::AuthOp {
                        op: AuthOp::SignUp,
                        result: result.clone().map(|outcome| match outcome {
                            SignUpOutcome::SignedIn => AuthOpOutcome::AwaitEvent,
                            SignUpOutcome::ConfirmationRequired => {
                                AuthOpOutcome::ConfirmationRequired
                            }
                        }),
                    });
                    let _ = reply.send(result);
                });
            }
            Command::SignInWithOAuth { reply } => {
                self.state.is_loading = true;
                let provider = Arc::clone(&self.provider);
                let done = self.completions.clone();
                let name = self.config.oauth_provider.clone();
                let redirect_to = self.config.oauth_redirect_to.clone();
                tokio::spawn(async move {
                    let result = provider
                        .sign_in_with_oauth(&name, redirect_to.as_deref())
                        .await;
                    let _ = done.send(Completion::AuthOp {
                        op: AuthOp::OAuth,
                        result: result.clone().map(AuthOpOutcome::Redirect),
                    });
                    let _ = reply.send(result.map(|_| ()));
                });
            }
            Command::SignOut { reply } => {
                self.state.is_loading = true;
                let provider = Arc::clone(&self.provider);
                let done = self.completions.clone();
                tokio::spawn(async move {
                    let result = provider.sign_out().await;
                    let _ = done.send(Completion::AuthOp {
                        op: AuthOp::SignOut,
                        result: result.clone().map(|()| AuthOpOutcome::AwaitEvent),
                    });
                    let _ = reply.send(result);
                });
            }
            Command::RefreshSponsor { reply } => {
                let _ = reply.send(self.refresh_sponsor());
            }
            Command::RefreshBuilder { reply } => {
                let _ = reply.send(self.refresh_builder());
            }
            Command::SetReturnTo(path) => self.return_to = path,
            Command::RegisterSponsor { form, reply } => {
                let Some(identity) = self.state.user().cloned() else {
                    let _ = reply.send(Err(RegistrationError::NotSignedIn));
                    return;
                };
                let epoch = self.epoch;
                let store = Arc::clone(&self.store);
                let done = self.completions.clone();
                tokio::spawn(async move {
                    let result = register_sponsor(store.as_ref(), &identity, &form).await;
                    let _ = done.send(Completion::Registered {
                        epoch,
                        user_id: identity.id,
                        result: result.as_ref().map(|_| ()).map_err(ToString::to_string),
                    });
                    let _ = reply.send(result);
                });
            }
        }
    }
}
