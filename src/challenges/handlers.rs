use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{ChallengeDetails, CreateChallengeRequest, UpdateChallengeRequest},
    repo_types::{Challenge, ChallengeFilters, ChallengeWithSponsor},
    services::{details, prepare_challenge, prepare_patch},
};
use crate::{
    auth::extractors::AuthUser, error::ApiError, sponsors::repo_types::SponsorProfile,
    state::AppState,
};

pub fn challenge_routes() -> Router<AppState> {
    Router::new()
        .route("/challenges", get(list_challenges).post(create_challenge))
        .route("/challenges/:id", get(get_challenge).patch(update_challenge))
}

#[instrument(skip(state))]
pub async fn list_challenges(
    State(state): State<AppState>,
    Query(filters): Query<ChallengeFilters>,
) -> Result<Json<Vec<ChallengeWithSponsor>>, ApiError> {
    Ok(Json(Challenge::list(&state.db, &filters).await?))
}

#[instrument(skip(state))]
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChallengeDetails>, ApiError> {
    let row = Challenge::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Challenge not found".into()))?;
    Ok(Json(details(row, OffsetDateTime::now_utc())))
}

async fn caller_sponsor(state: &AppState, user_id: Uuid) -> Result<SponsorProfile, ApiError> {
    SponsorProfile::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden("You must be a registered sponsor to create challenges.".into())
        })
}

#[instrument(skip(state, req))]
pub async fn create_challenge(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<Challenge>), ApiError> {
    let sponsor = caller_sponsor(&state, user_id).await?;
    let new = prepare_challenge(sponsor.id, &req)?;
    let challenge = Challenge::create(&state.db, &new).await?;
    info!(challenge_id = %challenge.id, sponsor_id = %sponsor.id, "challenge created");
    Ok((StatusCode::CREATED, Json(challenge)))
}

#[instrument(skip(state, req))]
pub async fn update_challenge(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChallengeRequest>,
) -> Result<Json<Challenge>, ApiError> {
    let sponsor = caller_sponsor(&state, user_id).await?;
    let patch = prepare_patch(&req)?;
    Challenge::update(&state.db, id, sponsor.id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Challenge not found".into()))
}
