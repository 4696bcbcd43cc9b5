use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::verify_access_token;
use crate::domain::errors::DomainError;
use crate::domain::policy::{authorize, Identity, ADMIN_ONLY};

/// Authenticated caller extractor for protected routes
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     AuthUser(identity): AuthUser,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello user {}", identity.user_id))
/// }
/// ```
pub struct AuthUser(pub Identity);

/// Caller identity when a valid bearer token is present; anonymous otherwise
pub struct OptionalAuthUser(pub Option<Identity>);

/// Authenticated caller holding the `SYSTEM_ADMIN` role
///
/// Rejects before the request body is read.
pub struct AdminUser(pub Identity);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Identity, DomainError> {
    let token = bearer_token(parts).ok_or(DomainError::Unauthorized)?;

    let claims = verify_access_token(token, &state.config.tokens.access_secret).map_err(|e| {
        tracing::debug!(error = %e, "access token rejected");
        DomainError::InvalidToken
    })?;

    Ok(claims.identity())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(authenticate(parts, state)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(authenticate(parts, state).ok()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state)?;
        let identity = authorize(Some(&identity), ADMIN_ONLY)?;
        Ok(AdminUser(*identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_access_token;
    use crate::config::Config;
    use crate::domain::user::Role;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token_for(state: &AppState, role: Role) -> String {
        create_access_token(
            Uuid::new_v4(),
            role,
            "t@example.com",
            &state.config.tokens.access_secret,
            state.config.tokens.access_ttl,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::in_memory(Config::default());
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.message, "Unauthorized");
    }

    #[tokio::test]
    async fn bad_token_is_invalid() {
        let state = AppState::in_memory(Config::default());
        let mut parts = parts_with(Some("Bearer not.a.token"));
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.message, "Invalid token");
    }

    #[tokio::test]
    async fn optional_auth_never_blocks() {
        let state = AppState::in_memory(Config::default());
        let mut parts = parts_with(Some("Bearer garbage"));
        let OptionalAuthUser(identity) = OptionalAuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(identity.is_none());

        let token = token_for(&state, Role::NormalUser);
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        let OptionalAuthUser(identity) = OptionalAuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.unwrap().role, Role::NormalUser);
    }

    #[tokio::test]
    async fn admin_extractor_checks_role() {
        let state = AppState::in_memory(Config::default());

        let token = token_for(&state, Role::StoreOwner);
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);

        let token = token_for(&state, Role::SystemAdmin);
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        assert!(AdminUser::from_request_parts(&mut parts, &state).await.is_ok());
    }
}
