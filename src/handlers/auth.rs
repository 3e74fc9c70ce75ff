//! Authentication HTTP handlers
//!
//! Thin glue between the transport and the token authority: each handler
//! validates the request shape, delegates, and wraps the result in the
//! uniform envelope.

use axum::{extract::State, http::StatusCode, Json};

use crate::error::ApiError;
use crate::middleware::{AuthenticatedUser, ValidatedJson};
use crate::models::{AuthPayload, LoginRequest, RefreshRequest, RegisterRequest, UserResponse};
use crate::response::Envelope;
use crate::state::AppState;

/// POST /auth/register - Create an account and issue the first token pair
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<AuthPayload>>), ApiError> {
    let payload = state
        .auth_service
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(payload, "User registered successfully")),
    ))
}

/// POST /auth/login - Verify credentials and issue a fresh token pair
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<Envelope<AuthPayload>>, ApiError> {
    let payload = state.auth_service.login(&req.email, &req.password).await?;

    Ok(Json(Envelope::success(payload, "Login successful")))
}

/// POST /auth/refresh - Rotate the token pair from a refresh token.
///
/// The refresh token arrives in the body, never as a bearer credential.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<Envelope<AuthPayload>>, ApiError> {
    let payload = state.auth_service.refresh_session(&req.refresh_token).await?;

    Ok(Json(Envelope::success(payload, "Session refreshed successfully")))
}

/// GET /auth/me - Current user's projection from the bearer token
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Envelope<UserResponse>>, ApiError> {
    let user = state.auth_service.current_user(user.user_id).await?;

    Ok(Json(Envelope::success(user, "Current user fetched successfully")))
}
