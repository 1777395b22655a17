use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::repo_types::BuilderProfile;
use super::services::{ensure_builder, ProvisionError, Provisioned};
use crate::{
    auth::{extractors::AuthUser, repo_types::User},
    error::ApiError,
    state::AppState,
};

pub fn builder_routes() -> Router<AppState> {
    Router::new()
        .route("/builders", post(create_my_builder))
        .route("/builders/me", get(get_my_builder))
}

#[instrument(skip(state))]
pub async fn get_my_builder(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BuilderProfile>, ApiError> {
    BuilderProfile::find_by_id(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Builder profile not found".into()))
}

/// Creates the caller's builder profile from their identity, or returns the
/// one that already exists.
#[instrument(skip(state))]
pub async fn create_my_builder(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<BuilderProfile>), ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let provisioned = ensure_builder(&state.profile_store(), &user.identity())
        .await
        .map_err(|e| {
            warn!(%user_id, error = %e, "create_my_builder failed");
            let msg = e.to_string();
            match e {
                ProvisionError::MissingEmail => ApiError::BadRequest(msg),
                ProvisionError::Lookup(s) | ProvisionError::Create(s) => ApiError::from(s),
            }
        })?;

    let status = match provisioned {
        Provisioned::Created(_) => StatusCode::CREATED,
        Provisioned::Existing(_) => StatusCode::OK,
    };
    Ok((status, Json(provisioned.into_profile())))
}
