use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::session::identity::{Identity, UserMetadata};

/// Row of the `users` table; one per identity the provider knows about.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // empty for identities without a password
    pub provider: String,
    pub metadata: Json<UserMetadata>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: Some(self.email.clone()),
            provider: self.provider.clone(),
            metadata: self.metadata.0.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub provider: String,
    pub metadata: UserMetadata,
}
