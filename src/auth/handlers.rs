use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RefreshRequest, RegisterRequest, SessionResponse, SessionState},
        extractors::{AuthUser, BearerToken},
        provider::LocalIdentityProvider,
        repo::PgUserDirectory,
        repo_types::User,
    },
    error::ApiError,
    session::{self, identity::IdentityProvider, Phase},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/session", get(get_session_state))
}

/// The session the provider opened for the call that just succeeded.
async fn opened(
    provider: &LocalIdentityProvider<PgUserDirectory>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = provider.get_session().await?.ok_or_else(|| {
        error!("provider reported success without a session");
        ApiError::Internal(anyhow::anyhow!("no session after sign-in"))
    })?;
    Ok(Json(session.into()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider = state.identity_provider();
    provider
        .sign_up(&payload.email, &payload.password, payload.attributes)
        .await?;
    opened(&provider).await
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider = state.identity_provider();
    provider
        .sign_in_with_password(&payload.email, &payload.password)
        .await?;
    opened(&provider).await
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .identity_provider()
        .refresh(&payload.refresh_token)
        .await?;
    Ok(Json(session.into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        error!(user_id = %user_id, "user not found");
        ApiError::Unauthorized("User not found".into())
    })?;

    Ok(Json(user.identity().into()))
}

/// Resolves the caller's session and profiles the way a signed-in client
/// would, provisioning a builder profile for OAuth identities.
#[instrument(skip(state, token))]
pub async fn get_session_state(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<SessionState>, ApiError> {
    let provider = Arc::new(state.identity_provider());
    let resumed = provider.resume(&token).await?;
    let (handle, _effects) = session::spawn(
        provider,
        Arc::new(state.profile_store()),
        state.resolver.clone(),
    );
    let snapshot = handle
        .wait_until(|s| s.phase != Phase::ResolvingSession && s.is_settled())
        .await?;
    info!(user_id = %resumed.user.id, standing = ?snapshot.standing(), "session resolved");
    Ok(Json(snapshot.into()))
}
