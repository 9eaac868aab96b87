use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{AuthResponse, CredentialsRequest, LogoutResponse, RefreshRequest};
use crate::shared::{AppError, AppState};
use crate::user::PublicUser;

/// HTTP handler for registering a new account
///
/// POST /api/registration
/// Returns a token pair and the public user view
#[instrument(name = "registration", skip(state, request))]
pub async fn registration(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!(email = %request.email, "Registration requested");

    let response = state
        .auth_service
        .registration(&request.email, &request.password)
        .await?;

    info!(user_id = %response.user.id, "Registration succeeded");
    Ok(Json(response))
}

/// HTTP handler for consuming an activation link
///
/// GET /api/activate/:link
#[instrument(name = "activate", skip(state, link))]
pub async fn activate(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.auth_service.activate(&link).await?;

    Ok(Json(serde_json::json!({ "activated": true })))
}

/// HTTP handler for credential login
///
/// POST /api/login
/// Returns a token pair and the public user view
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!(email = %request.email, "Login requested");

    let response = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    info!(user_id = %response.user.id, "Login succeeded");
    Ok(Json(response))
}

/// HTTP handler for logout
///
/// POST /api/logout
/// Reports whether a live session was revoked; an unknown token is not an error
#[instrument(name = "logout", skip(state, request))]
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<LogoutResponse>, AppError> {
    let removed = state.auth_service.logout(&request.refresh_token).await?;

    Ok(Json(LogoutResponse {
        revoked: removed.is_some(),
    }))
}

/// HTTP handler for refresh token rotation
///
/// POST /api/refresh
/// Returns a brand-new token pair; the presented refresh token is consumed
#[instrument(name = "refresh", skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = state.auth_service.refresh(&request.refresh_token).await?;

    info!(user_id = %response.user.id, "Refresh succeeded");
    Ok(Json(response))
}

/// HTTP handler for listing all users
///
/// GET /api/users (behind the access-token middleware)
/// Returns a flat array of public user views
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.auth_service.list_users().await?;

    info!(user_count = users.len(), "Users listed");
    Ok(Json(users))
}
