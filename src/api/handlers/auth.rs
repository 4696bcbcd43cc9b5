use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::application::services::{Registration, TokenPair};
use crate::domain::user::PublicUser;

/// Request body for user registration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response from successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Request body for user login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new user
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(req) = body?;

    let user = state
        .auth_service()
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
            user,
        }),
    ))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = body?;
    let tokens = state.auth_service().login(&req.email, &req.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
///
/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = body?;
    if req.refresh_token.is_empty() {
        return Err(ApiError::unauthorized("Refresh token required"));
    }
    let tokens = state.auth_service().refresh(&req.refresh_token).await?;
    Ok(Json(tokens))
}

/// Revoke the caller's refresh token
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service().logout(identity.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// GET /
pub async fn root() -> &'static str {
    "API is working"
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
