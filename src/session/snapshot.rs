use serde::Serialize;

use super::identity::{Identity, Session};
use crate::builders::repo_types::BuilderProfile;
use crate::sponsors::repo_types::SponsorProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Signed out after having been signed in.
    Anonymous,
    ResolvingSession,
    ResolvingProfiles,
    Resolved,
}

/// What a settled snapshot says about the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Anonymous,
    Builder,
    Sponsor,
    Both,
    /// Signed in, but neither profile exists yet.
    Unregistered,
}

/// Immutable view of the resolver state handed to readers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub phase: Phase,
    pub session: Option<Session>,
    pub sponsor_profile: Option<SponsorProfile>,
    pub builder_profile: Option<BuilderProfile>,
    pub is_loading: bool,
    pub is_loading_profiles: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::ResolvingSession,
            session: None,
            sponsor_profile: None,
            builder_profile: None,
            is_loading: true,
            is_loading_profiles: false,
        }
    }
}

impl AuthSnapshot {
    pub fn user(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_sponsor(&self) -> bool {
        self.sponsor_profile.is_some()
    }

    pub fn is_builder(&self) -> bool {
        self.builder_profile.is_some()
    }

    pub fn is_settled(&self) -> bool {
        !self.is_loading && !self.is_loading_profiles
    }

    pub fn standing(&self) -> Standing {
        if self.session.is_none() {
            return Standing::Anonymous;
        }
        match (self.is_sponsor(), self.is_builder()) {
            (true, true) => Standing::Both,
            (true, false) => Standing::Sponsor,
            (false, true) => Standing::Builder,
            (false, false) => Standing::Unregistered,
        }
    }
}
