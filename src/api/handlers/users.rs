use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::auth::MessageResponse;
use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change the caller's own password
///
/// PATCH /users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;

    state
        .user_service()
        .change_password(identity.user_id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
