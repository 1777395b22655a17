use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Challenge {
    pub id: Uuid,
    pub sponsor_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub reward_structure: Option<String>,
    pub industry: Option<String>,
    pub skill_level: Option<SkillLevel>,
    pub rubric: Option<String>,
    pub data_pack_url: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub closed_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Public sponsor fields shown next to a challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SponsorSummary {
    pub name: String,
    pub company: Option<String>,
    pub website: Option<String>,
}

/// Challenge row joined with its sponsor.
#[derive(Debug, Clone, FromRow)]
pub struct ChallengeWithSponsorRow {
    #[sqlx(flatten)]
    pub challenge: Challenge,
    pub sponsor_name: Option<String>,
    pub sponsor_company: Option<String>,
    pub sponsor_website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeWithSponsor {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub sponsor: Option<SponsorSummary>,
}

impl From<ChallengeWithSponsorRow> for ChallengeWithSponsor {
    fn from(r: ChallengeWithSponsorRow) -> Self {
        let sponsor = r.sponsor_name.map(|name| SponsorSummary {
            name,
            company: r.sponsor_company,
            website: r.sponsor_website,
        });
        Self {
            challenge: r.challenge,
            sponsor,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChallengeFilters {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChallenge {
    pub sponsor_id: Uuid,
    pub title: String,
    pub description: String,
    pub deadline: OffsetDateTime,
    pub reward_structure: String,
    pub industry: String,
    pub skill_level: SkillLevel,
    pub rubric: String,
    pub data_pack_url: Option<String>,
    pub logo_url: Option<String>,
}

/// Partial update; `None` leaves the column unchanged. The nullable columns
/// take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<OffsetDateTime>,
    pub reward_structure: Option<String>,
    pub industry: Option<String>,
    pub skill_level: Option<SkillLevel>,
    pub rubric: Option<String>,
    pub data_pack_url: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
    pub closed_at: Option<Option<OffsetDateTime>>,
}
