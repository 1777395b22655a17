use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::builders::repo_types::BuilderProfile;
use crate::session::identity::{Identity, Session, SignUpAttributes, UserMetadata};
use crate::session::{AuthSnapshot, Phase, Standing};
use crate::sponsors::repo_types::SponsorProfile;

/// Sign-up body; `name`, `company` and `website` sit next to the credentials.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub attributes: SignUpAttributes,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub provider: String,
    pub metadata: UserMetadata,
}

impl From<Identity> for PublicUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            provider: identity.provider,
            metadata: identity.metadata,
        }
    }
}

/// Returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub user: PublicUser,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
            user: session.user.into(),
        }
    }
}

/// A settled resolver snapshot as the client sees it.
#[derive(Debug, Serialize)]
pub struct SessionState {
    pub phase: Phase,
    pub standing: Standing,
    pub user: Option<PublicUser>,
    pub sponsor_profile: Option<SponsorProfile>,
    pub builder_profile: Option<BuilderProfile>,
}

impl From<AuthSnapshot> for SessionState {
    fn from(snapshot: AuthSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            standing: snapshot.standing(),
            user: snapshot.session.map(|s| s.user.into()),
            sponsor_profile: snapshot.sponsor_profile,
            builder_profile: snapshot.builder_profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{github_identity, session_for, sponsor_row};

    #[test]
    fn register_request_reads_attributes_inline() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "b@y.com",
            "password": "long-enough",
            "name": "Acme",
            "website": "https://acme.io",
        }))
        .unwrap();
        assert_eq!(req.attributes.name.as_deref(), Some("Acme"));
        assert_eq!(req.attributes.website.as_deref(), Some("https://acme.io"));
        assert!(req.attributes.company.is_none());
    }

    #[test]
    fn session_state_reports_standing() {
        let identity = github_identity("a@x.com", Some("abc"));
        let snapshot = AuthSnapshot {
            phase: Phase::Resolved,
            session: Some(session_for(&identity)),
            sponsor_profile: Some(sponsor_row(identity.id, "a@x.com", "Acme")),
            is_loading: false,
            ..Default::default()
        };
        let json = serde_json::to_value(SessionState::from(snapshot)).unwrap();
        assert_eq!(json["phase"], "resolved");
        assert_eq!(json["standing"], "sponsor");
        assert_eq!(json["user"]["provider"], "github");
        assert_eq!(json["user"]["metadata"]["user_name"], "abc");
        assert_eq!(json["sponsor_profile"]["name"], "Acme");
        assert!(json["builder_profile"].is_null());
    }

    #[test]
    fn session_response_omits_the_provider_token() {
        let identity = github_identity("a@x.com", None);
        let json = serde_json::to_value(SessionResponse::from(session_for(&identity))).unwrap();
        assert_eq!(json["access_token"], format!("access-{}", identity.id));
        assert_eq!(json["user"]["email"], "a@x.com");
        assert!(json["expires_at"].is_null());
        assert!(json.get("provider_token").is_none());
    }
}
