use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::pagination::PageRequest;
use crate::domain::rating::{Rating, RatingValue, RatingWithRater, StoreAggregate};

/// Repository trait for ratings and their aggregates
///
/// Implementations must enforce uniqueness of (user_id, store_id).
#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn find_by_user_and_store(
        &self,
        user_id: Uuid,
        store_id: Uuid,
    ) -> RepositoryResult<Option<Rating>>;

    /// Insert a new rating; an existing row for the same user and store
    /// yields `RepositoryError::UniqueViolation`
    async fn insert(&self, rating: &Rating) -> RepositoryResult<()>;

    /// Set a new value and `updated_at` on an existing rating
    async fn update_value(
        &self,
        id: Uuid,
        value: RatingValue,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Rating>;

    async fn aggregate_for_store(&self, store_id: Uuid) -> RepositoryResult<StoreAggregate>;

    /// Aggregates for many stores in one grouped query; stores without
    /// ratings are absent from the map
    async fn aggregate_for_stores(
        &self,
        store_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, StoreAggregate>>;

    /// The given user's ratings among `store_ids`
    async fn find_by_user_for_stores(
        &self,
        user_id: Uuid,
        store_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Rating>>;

    /// Ratings of a store with their authors, newest first; `None` returns all
    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<Vec<RatingWithRater>>;

    async fn count(&self) -> RepositoryResult<i64>;
}
