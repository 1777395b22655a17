use uuid::Uuid;

use super::dto::CreateSubmissionRequest;
use super::repo_types::NewSubmission;
use crate::validation::{is_valid_url, optional_url, ValidationError};

const BAD_LINK: &str = "Please enter a valid URL.";

/// Builds the row for `builder_id`; the caller's id always wins over anything in the request.
pub fn prepare_submission(
    builder_id: Uuid,
    req: &CreateSubmissionRequest,
) -> Result<NewSubmission, ValidationError> {
    let repo = req.github_repo_link.trim();
    if !is_valid_url(repo) {
        return Err(ValidationError::new("github_repo_link", BAD_LINK));
    }
    Ok(NewSubmission {
        builder_id,
        challenge_id: req.challenge_id,
        github_repo_link: repo.to_owned(),
        demo_video_link: optional_url("demo_video_link", req.demo_video_link.as_deref(), BAD_LINK)?,
        pitch_deck_link: optional_url("pitch_deck_link", req.pitch_deck_link.as_deref(), BAD_LINK)?,
    })
}
