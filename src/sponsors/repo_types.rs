use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Sponsor record, linked to an identity through `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SponsorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub website: Option<String>,
    pub notify_new_submissions: Option<bool>,
    pub notify_deadlines: Option<bool>,
    pub notify_candidate_updates: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Insert payload; notification flags take the table defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSponsor {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub website: Option<String>,
}
