use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::pagination::{Page, StoreQuery};
use crate::domain::store::Store;

/// Repository trait for stores
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn create(&self, store: &Store) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Store>>;

    /// Filtered, sorted page of stores
    async fn list(&self, query: &StoreQuery) -> RepositoryResult<Page<Store>>;

    /// All stores owned by a user, ordered by name
    async fn find_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Store>>;

    async fn count(&self) -> RepositoryResult<i64>;
}
