use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub builder_id: Option<Uuid>,
    pub challenge_id: Option<Uuid>,
    pub github_repo_link: String,
    pub demo_video_link: Option<String>,
    pub pitch_deck_link: Option<String>,
    pub provisional_score: Option<f64>,
    pub test_passed: Option<bool>,
    pub ai_feedback: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submission_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Submission as a sponsor reviews it: who sent it and for which challenge.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionForReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub builder_name: Option<String>,
    pub builder_email: Option<String>,
    pub challenge_title: Option<String>,
}

/// Submission as its builder sees it on the dashboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BuilderSubmission {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub challenge_title: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub challenge_deadline: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub builder_id: Uuid,
    pub challenge_id: Uuid,
    pub github_repo_link: String,
    pub demo_video_link: Option<String>,
    pub pitch_deck_link: Option<String>,
}
