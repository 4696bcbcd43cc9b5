use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::pagination::{Page, UserQuery};
use crate::domain::user::{Email, User};

/// Repository trait for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email yields `RepositoryError::UniqueViolation`
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;

    /// Filtered, sorted page of users
    async fn list(&self, query: &UserQuery) -> RepositoryResult<Page<User>>;

    /// Replace the password hash and drop any stored refresh token
    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()>;

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<()>;

    async fn count(&self) -> RepositoryResult<i64>;
}
