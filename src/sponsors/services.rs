use thiserror::Error;
use tracing::{info, warn};

use super::dto::SponsorRegistration;
use super::repo_types::{NewSponsor, SponsorProfile};
use crate::session::identity::Identity;
use crate::store::{ProfileStore, StoreError};
use crate::validation::{bounded, optional_bounded, optional_url, ValidationError};

const EMAIL_CONSTRAINT: &str = "sponsors_email_key";
const USER_LINK_CONSTRAINT: &str = "sponsors_user_id_key";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("You must be signed in to register as a sponsor.")]
    NotSignedIn,
    #[error("User email is not available.")]
    MissingEmail,
    #[error("This email is already registered as a sponsor.")]
    EmailTaken,
    #[error("This user account is already linked to a sponsor profile.")]
    AlreadyLinked,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        if e.violates(EMAIL_CONSTRAINT) {
            RegistrationError::EmailTaken
        } else if e.violates(USER_LINK_CONSTRAINT) {
            RegistrationError::AlreadyLinked
        } else {
            RegistrationError::Store(e)
        }
    }
}

/// Validates the form and binds it to the identity it is submitted for.
pub fn prepare_registration(
    identity: &Identity,
    form: &SponsorRegistration,
) -> Result<NewSponsor, RegistrationError> {
    let email = identity
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(RegistrationError::MissingEmail)?;

    Ok(NewSponsor {
        user_id: identity.id,
        email: email.to_owned(),
        name: bounded(
            "name",
            &form.name,
            2,
            100,
            "Sponsor/Organization name is required.",
        )?,
        company: optional_bounded(
            "company",
            form.company.as_deref(),
            2,
            100,
            "Company name is required.",
        )?,
        website: optional_url(
            "website",
            form.website.as_deref(),
            "Please enter a valid website URL.",
        )?,
    })
}

pub async fn register_sponsor<S>(
    store: &S,
    identity: &Identity,
    form: &SponsorRegistration,
) -> Result<SponsorProfile, RegistrationError>
where
    S: ProfileStore + ?Sized,
{
    let new = prepare_registration(identity, form)?;
    match store.insert_sponsor(&new).await {
        Ok(sponsor) => {
            info!(user_id = %sponsor.user_id, sponsor_id = %sponsor.id, "sponsor registered");
            Ok(sponsor)
        }
        Err(e) => {
            warn!(user_id = %identity.id, error = %e, code = e.code(), "sponsor registration failed");
            Err(e.into())
        }
    }
}
