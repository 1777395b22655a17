use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Builder record; `id` is the identity's subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BuilderProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub github_handle: Option<String>,
    pub github_url: Option<String>,
    pub avatar_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuilder {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub github_handle: Option<String>,
    pub github_url: Option<String>,
    pub avatar_url: Option<String>,
}
