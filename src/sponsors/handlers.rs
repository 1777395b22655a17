use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::SponsorRegistration,
    repo_types::SponsorProfile,
    services::{register_sponsor, RegistrationError},
};
use crate::{
    auth::{extractors::AuthUser, repo_types::User},
    error::ApiError,
    state::AppState,
};

pub fn sponsor_routes() -> Router<AppState> {
    Router::new()
        .route("/sponsors", post(create_sponsor))
        .route("/sponsors/me", get(get_my_sponsor))
}

#[instrument(skip(state))]
pub async fn get_my_sponsor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SponsorProfile>, ApiError> {
    SponsorProfile::find_by_user_id(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Sponsor profile not found".into()))
}

#[instrument(skip(state, form))]
pub async fn create_sponsor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(form): Json<SponsorRegistration>,
) -> Result<(StatusCode, Json<SponsorProfile>), ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let sponsor = register_sponsor(&state.profile_store(), &user.identity(), &form)
        .await
        .map_err(|e| {
            warn!(%user_id, error = %e, "create_sponsor failed");
            let msg = e.to_string();
            match e {
                RegistrationError::Invalid(v) => ApiError::from(v),
                RegistrationError::NotSignedIn => ApiError::Unauthorized(msg),
                RegistrationError::MissingEmail => ApiError::BadRequest(msg),
                RegistrationError::EmailTaken | RegistrationError::AlreadyLinked => {
                    ApiError::Conflict(msg)
                }
                RegistrationError::Store(s) => ApiError::from(s),
            }
        })?;

    Ok((StatusCode::CREATED, Json(sponsor)))
}
