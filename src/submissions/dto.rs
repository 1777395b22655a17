use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionQuery {
    #[serde(default)]
    pub challenge_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmissionRequest {
    pub challenge_id: Uuid,
    pub github_repo_link: String,
    #[serde(default)]
    pub demo_video_link: Option<String>,
    #[serde(default)]
    pub pitch_deck_link: Option<String>,
}
