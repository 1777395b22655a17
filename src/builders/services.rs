use thiserror::Error;
use tracing::{debug, info, warn};

use super::repo_types::{BuilderProfile, NewBuilder};
use crate::session::identity::Identity;
use crate::store::{found, ProfileStore, StoreError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("builder lookup failed: {0}")]
    Lookup(#[source] StoreError),
    #[error("GitHub account has no email address")]
    MissingEmail,
    #[error("could not create builder profile: {0}")]
    Create(#[source] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    Existing(BuilderProfile),
    Created(BuilderProfile),
}

impl Provisioned {
    pub fn into_profile(self) -> BuilderProfile {
        match self {
            Provisioned::Existing(p) | Provisioned::Created(p) => p,
        }
    }
}

/// Builds the row for a first-time OAuth identity.
///
/// Name preference: full name, then provider handle, then `builder-<id prefix>`.
pub fn synthesize_builder(identity: &Identity) -> Result<NewBuilder, ProvisionError> {
    let email = identity
        .contact_email()
        .ok_or(ProvisionError::MissingEmail)?
        .to_owned();
    let handle = identity.metadata.handle().map(str::to_owned);
    let name = identity
        .metadata
        .display_name()
        .map(str::to_owned)
        .or_else(|| handle.clone())
        .unwrap_or_else(|| fallback_name(identity));

    Ok(NewBuilder {
        id: identity.id,
        email,
        name,
        github_url: handle.as_ref().map(|h| format!("https://github.com/{h}")),
        github_handle: handle,
        avatar_url: identity
            .metadata
            .avatar_url
            .clone()
            .filter(|u| !u.trim().is_empty()),
    })
}

fn fallback_name(identity: &Identity) -> String {
    let simple = identity.id.simple().to_string();
    format!("builder-{}", &simple[..8])
}

/// Looks the builder up and creates it when absent.
///
/// A unique violation on insert means another session provisioned the same
/// identity first; the existing row is returned instead of a second one.
pub async fn ensure_builder<S>(store: &S, identity: &Identity) -> Result<Provisioned, ProvisionError>
where
    S: ProfileStore + ?Sized,
{
    if let Some(existing) = found(store.find_builder(identity.id).await).map_err(ProvisionError::Lookup)? {
        debug!(user_id = %identity.id, "builder profile exists");
        return Ok(Provisioned::Existing(existing));
    }

    let new = synthesize_builder(identity)?;
    match store.insert_builder(&new).await {
        Ok(created) => {
            info!(user_id = %created.id, name = %created.name, "builder profile created");
            Ok(Provisioned::Created(created))
        }
        Err(e @ StoreError::UniqueViolation { .. }) => {
            warn!(user_id = %identity.id, error = %e, "builder created concurrently; re-reading");
            found(store.find_builder(identity.id).await)
                .map_err(ProvisionError::Lookup)?
                .map(Provisioned::Existing)
                .ok_or(ProvisionError::Create(e))
        }
        Err(e) => Err(ProvisionError::Create(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::identity::UserMetadata;
    use crate::testing::{github_identity, MemoryProfileStore};
    use uuid::Uuid;

    #[test]
    fn synthesizes_from_handle_only() {
        let identity = github_identity("a@x.com", Some("abc"));
        let new = synthesize_builder(&identity).unwrap();
        assert_eq!(new.id, identity.id);
        assert_eq!(new.email, "a@x.com");
        assert_eq!(new.name, "abc");
        assert_eq!(new.github_handle.as_deref(), Some("abc"));
        assert_eq!(new.github_url.as_deref(), Some("https://github.com/abc"));
    }

    #[test]
    fn full_name_wins_over_handle() {
        let mut identity = github_identity("a@x.com", Some("abc"));
        identity.metadata.full_name = Some("Ada Lovelace".into());
        let new = synthesize_builder(&identity).unwrap();
        assert_eq!(new.name, "Ada Lovelace");
        assert_eq!(new.github_handle.as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_generated_name() {
        let identity = Identity {
            id: Uuid::parse_str("1234abcd-0000-0000-0000-000000000000").unwrap(),
            email: Some("a@x.com".into()),
            provider: "github".into(),
            metadata: UserMetadata::default(),
        };
        let new = synthesize_builder(&identity).unwrap();
        assert_eq!(new.name, "builder-1234abcd");
        assert!(new.github_handle.is_none());
        assert!(new.github_url.is_none());
    }

    #[test]
    fn missing_email_is_rejected() {
        let mut identity = github_identity("a@x.com", Some("abc"));
        identity.email = None;
        assert!(matches!(
            synthesize_builder(&identity),
            Err(ProvisionError::MissingEmail)
        ));
    }

    #[tokio::test]
    async fn ensure_builder_is_idempotent() {
        let store = MemoryProfileStore::default();
        let identity = github_identity("a@x.com", Some("abc"));

        let first = ensure_builder(&store, &identity).await.unwrap();
        assert!(matches!(first, Provisioned::Created(_)));
        let second = ensure_builder(&store, &identity).await.unwrap();
        assert!(matches!(second, Provisioned::Existing(_)));

        assert_eq!(store.builder_count(), 1);
        assert_eq!(store.builder_inserts(), 1);
    }

    #[tokio::test]
    async fn lookup_failure_does_not_create() {
        let store = MemoryProfileStore::default();
        store.fail_builder_lookups(true);
        let identity = github_identity("a@x.com", Some("abc"));

        let err = ensure_builder(&store, &identity).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Lookup(_)));
        assert_eq!(store.builder_inserts(), 0);
    }
}
