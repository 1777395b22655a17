use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::presentation::{Milestone, Prize};
use super::repo_types::{ChallengeWithSponsor, SkillLevel};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub reward_structure: String,
    pub industry: String,
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub data_pack_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub rubric: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChallengeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    #[serde(default)]
    pub reward_structure: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub rubric: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub data_pack_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_timestamp")]
    pub closed_at: Option<Option<OffsetDateTime>>,
}

/// Maps a field that is present in the body to `Some`, so an explicit `null`
/// arrives as `Some(None)` while an absent field stays `None`.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn present_timestamp<'de, D>(d: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::option::deserialize(d).map(Some)
}

/// A challenge with everything the details page renders.
#[derive(Debug, Serialize)]
pub struct ChallengeDetails {
    #[serde(flatten)]
    pub challenge: ChallengeWithSponsor,
    pub days_left: Option<i64>,
    pub skill_level_label: String,
    pub categories: Vec<String>,
    pub prize_breakdown: Vec<Prize>,
    pub timeline: Vec<Milestone>,
    pub requirements: Vec<String>,
}
