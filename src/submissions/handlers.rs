use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateSubmissionRequest, SubmissionQuery},
    repo_types::{BuilderSubmission, Submission, SubmissionForReview},
    services::prepare_submission,
};
use crate::{
    auth::extractors::AuthUser, builders::repo_types::BuilderProfile, error::ApiError,
    state::AppState,
};

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(list_submissions).post(create_submission))
        .route("/submissions/mine", get(list_my_submissions))
}

#[instrument(skip(state))]
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<SubmissionQuery>,
) -> Result<Json<Vec<SubmissionForReview>>, ApiError> {
    Ok(Json(
        Submission::list_for_review(&state.db, query.challenge_id).await?,
    ))
}

#[instrument(skip(state))]
pub async fn list_my_submissions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<BuilderSubmission>>, ApiError> {
    Ok(Json(Submission::list_for_builder(&state.db, user_id).await?))
}

#[instrument(skip(state, req))]
pub async fn create_submission(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let builder = BuilderProfile::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden("A builder profile is required to submit an application.".into())
        })?;

    let new = prepare_submission(builder.id, &req)?;
    let submission = Submission::create(&state.db, &new).await?;
    info!(submission_id = %submission.id, %user_id, "submission created");
    Ok((StatusCode::CREATED, Json(submission)))
}
