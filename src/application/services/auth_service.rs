//! Registration, login and token refresh.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::repo_error;
use crate::auth::jwt::{create_access_token, create_refresh_token, verify_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::config::TokenConfig;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::domain::user::value_objects::{
    validate_registration_name, validate_registration_password,
};
use crate::domain::user::{Email, PublicUser, Role, User};

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Input for self-registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenConfig,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenConfig, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// Registers a `NORMAL_USER`
    ///
    /// A taken email is a `Conflict`; the existing record is left untouched.
    pub async fn register(&self, registration: Registration) -> DomainResult<PublicUser> {
        validate_registration_name(&registration.name)?;
        let email = Email::new(registration.email)?;
        validate_registration_password(&registration.password)?;

        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(repo_error)?
            .is_some()
        {
            return Err(DomainError::conflict("Email already registered"));
        }

        let password_hash = hash_password(&registration.password, self.bcrypt_cost)
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))?;

        let user = User::new(
            registration.name.trim(),
            email,
            password_hash,
            None,
            Role::NormalUser,
        );
        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::UniqueViolation(_) => DomainError::conflict("Email already registered"),
            other => repo_error(other),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(PublicUser::from(user))
    }

    /// Verifies credentials and issues a token pair
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<TokenPair> {
        let email = Email::new(email).map_err(|_| DomainError::InvalidCredentials)?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(repo_error)?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            DomainError::internal(format!("Password verification failed: {}", e))
        })?;
        if !valid {
            tracing::debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        self.issue_tokens(&user).await
    }

    /// Exchanges a valid, current refresh token for a new pair
    ///
    /// The presented token must match the one stored for the user; the
    /// stored token is rotated on every successful refresh.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let claims = verify_refresh_token(refresh_token, &self.tokens.refresh_secret)
            .map_err(|_| DomainError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(repo_error)?
            .ok_or(DomainError::InvalidToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::debug!(user_id = %user.id, "refresh rejected: token not current");
            return Err(DomainError::InvalidToken);
        }

        self.issue_tokens(&user).await
    }

    /// Revokes the stored refresh token
    pub async fn logout(&self, user_id: Uuid) -> DomainResult<()> {
        self.users
            .set_refresh_token(user_id, None)
            .await
            .map_err(repo_error)
    }

    async fn issue_tokens(&self, user: &User) -> DomainResult<TokenPair> {
        let access_token = create_access_token(
            user.id,
            user.role,
            user.email.as_str(),
            &self.tokens.access_secret,
            self.tokens.access_ttl,
        )
        .map_err(|e| DomainError::internal(format!("Failed to create token: {}", e)))?;
        let refresh_token =
            create_refresh_token(user.id, &self.tokens.refresh_secret, self.tokens.refresh_ttl)
                .map_err(|e| DomainError::internal(format!("Failed to create token: {}", e)))?;

        self.users
            .set_refresh_token(user.id, Some(&refresh_token))
            .await
            .map_err(repo_error)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_access_token;
    use crate::config::Config;
    use crate::infrastructure::repositories::InMemoryDatabase;

    fn service() -> (Arc<InMemoryDatabase>, AuthService) {
        let db = Arc::new(InMemoryDatabase::new());
        let config = Config::default();
        (db.clone(), AuthService::new(db, config.tokens, 4))
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Reggie".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_normal_user() {
        let (_db, service) = service();
        let user = service.register(registration("a@b.com")).await.unwrap();
        assert_eq!(user.role, Role::NormalUser);
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn duplicate_registration_is_conflict_and_keeps_first_user() {
        let (db, service) = service();
        let first = service.register(registration("a@b.com")).await.unwrap();

        let mut second = registration("a@b.com");
        second.name = "Someone Else".to_string();
        let err = service.register(second).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let stored = db
            .find_by_email(&Email::new("a@b.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "Reggie");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (_db, service) = service();
        let mut short_name = registration("x@y.com");
        short_name.name = "Al".to_string();
        assert!(matches!(
            service.register(short_name).await,
            Err(DomainError::Validation(_))
        ));

        let mut short_password = registration("x@y.com");
        short_password.password = "short".to_string();
        assert!(matches!(
            service.register(short_password).await,
            Err(DomainError::Validation(_))
        ));

        assert!(matches!(
            service.register(registration("not-an-email")).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_issues_tokens_with_role() {
        let (_db, service) = service();
        let user = service.register(registration("login@b.com")).await.unwrap();

        let tokens = service.login("login@b.com", "password123").await.unwrap();
        let claims =
            verify_access_token(&tokens.access_token, &Config::default().tokens.access_secret)
                .unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::NormalUser);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (_db, service) = service();
        service.register(registration("login@b.com")).await.unwrap();

        assert_eq!(
            service.login("login@b.com", "wrong-password").await,
            Err(DomainError::InvalidCredentials)
        );
        assert_eq!(
            service.login("nobody@b.com", "password123").await,
            Err(DomainError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let (_db, service) = service();
        service.register(registration("r@b.com")).await.unwrap();
        let tokens = service.login("r@b.com", "password123").await.unwrap();

        let rotated = service.refresh(&tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        // The previous refresh token is no longer current
        assert_eq!(
            service.refresh(&tokens.refresh_token).await,
            Err(DomainError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn logout_revokes_refresh_token() {
        let (_db, service) = service();
        let user = service.register(registration("out@b.com")).await.unwrap();
        let tokens = service.login("out@b.com", "password123").await.unwrap();

        service.logout(user.id).await.unwrap();
        assert_eq!(
            service.refresh(&tokens.refresh_token).await,
            Err(DomainError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn garbage_refresh_token_is_invalid() {
        let (_db, service) = service();
        assert_eq!(
            service.refresh("garbage").await,
            Err(DomainError::InvalidToken)
        );
    }
}
