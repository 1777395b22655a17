use tokio::sync::{mpsc, oneshot, watch};

use super::identity::{AuthError, SignUpAttributes, SignUpOutcome};
use super::resolver::Command;
use super::snapshot::AuthSnapshot;
use crate::sponsors::dto::SponsorRegistration;
use crate::sponsors::repo_types::SponsorProfile;
use crate::sponsors::services::RegistrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Started,
    /// A lookup for the same profile is already running; nothing was issued.
    AlreadyInFlight,
    NoSession,
}

/// Cheap, cloneable access to a running resolver.
#[derive(Clone)]
pub struct AuthHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<AuthSnapshot>,
}

impl AuthHandle {
    pub(super) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshots: watch::Receiver<AuthSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshots.clone()
    }

    /// Resolves with the first snapshot, current one included, that satisfies `ready`.
    pub async fn wait_until(
        &self,
        ready: impl FnMut(&AuthSnapshot) -> bool,
    ) -> Result<AuthSnapshot, AuthError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(ready)
            .await
            .map_err(|_| AuthError::ResolverStopped)?;
        Ok(snapshot.clone())
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(command(reply)).ok()?;
        rx.await.ok()
    }

    /// Resolves once the provider has answered; the session itself arrives
    /// through the provider's `SignedIn` event.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.request(|reply| Command::SignInWithPassword {
            email: email.to_owned(),
            password: password.to_owned(),
            reply,
        })
        .await
        .unwrap_or(Err(AuthError::ResolverStopped))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: SignUpAttributes,
    ) -> Result<SignUpOutcome, AuthError> {
        self.request(|reply| Command::SignUp {
            email: email.to_owned(),
            password: password.to_owned(),
            attributes,
            reply,
        })
        .await
        .unwrap_or(Err(AuthError::ResolverStopped))
    }

    /// Asks the provider for an authorization URL; the host receives it as
    /// an `Effect::ExternalRedirect`.
    pub async fn sign_in_with_oauth(&self) -> Result<(), AuthError> {
        self.request(|reply| Command::SignInWithOAuth { reply })
            .await
            .unwrap_or(Err(AuthError::ResolverStopped))
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.request(|reply| Command::SignOut { reply })
            .await
            .unwrap_or(Err(AuthError::ResolverStopped))
    }

    pub async fn refresh_sponsor_profile(&self) -> Result<RefreshStatus, AuthError> {
        self.request(|reply| Command::RefreshSponsor { reply })
            .await
            .ok_or(AuthError::ResolverStopped)
    }

    pub async fn refresh_builder_profile(&self) -> Result<RefreshStatus, AuthError> {
        self.request(|reply| Command::RefreshBuilder { reply })
            .await
            .ok_or(AuthError::ResolverStopped)
    }

    /// Route to open after the next sign-in instead of the default landing page.
    pub fn set_return_to(&self, path: impl Into<String>) {
        let _ = self.commands.send(Command::SetReturnTo(Some(path.into())));
    }

    pub fn clear_return_to(&self) {
        let _ = self.commands.send(Command::SetReturnTo(None));
    }

    /// Registers the signed-in user as a sponsor, then reloads the sponsor profile.
    pub async fn register_sponsor(
        &self,
        form: SponsorRegistration,
    ) -> Result<SponsorProfile, RegistrationError> {
        self.request(|reply| Command::RegisterSponsor { form, reply })
            .await
            .unwrap_or(Err(RegistrationError::NotSignedIn))
    }
}
