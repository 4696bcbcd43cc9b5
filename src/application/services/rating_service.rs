//! Rating submission (insert-or-update) and per-store aggregates.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::repo_error;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::rating::{Rating, RatingValue, StoreAggregate};
use crate::domain::repositories::{RatingRepository, RepositoryError, StoreRepository};

/// Result of a rating submission: the stored row and the store's
/// recomputed aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSubmission {
    pub rating: Rating,
    pub aggregate: StoreAggregate,
}

/// Service for submitting ratings
pub struct RatingService {
    stores: Arc<dyn StoreRepository>,
    ratings: Arc<dyn RatingRepository>,
}

impl RatingService {
    pub fn new(stores: Arc<dyn StoreRepository>, ratings: Arc<dyn RatingRepository>) -> Self {
        Self { stores, ratings }
    }

    /// Creates or updates the caller's rating of a store
    ///
    /// The value is validated before any persistence call. If a concurrent
    /// submission by the same user wins the insert, the unique constraint
    /// rejects ours and the submission is retried as an update.
    pub async fn upsert_rating(
        &self,
        user_id: Uuid,
        store_id: Uuid,
        raw_value: &Value,
    ) -> DomainResult<RatingSubmission> {
        let value = RatingValue::from_json(raw_value)?;

        self.stores
            .find_by_id(store_id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("Store not found"))?;

        let rating = match self.update_existing(user_id, store_id, value).await? {
            Some(updated) => updated,
            None => {
                let rating = Rating::new(user_id, store_id, value);
                match self.ratings.insert(&rating).await {
                    Ok(()) => rating,
                    Err(RepositoryError::UniqueViolation(_)) => {
                        tracing::debug!(%user_id, %store_id, "concurrent rating insert, retrying as update");
                        self.update_existing(user_id, store_id, value)
                            .await?
                            .ok_or_else(|| {
                                DomainError::internal("Rating vanished after unique violation")
                            })?
                    }
                    Err(e) => return Err(repo_error(e)),
                }
            }
        };

        let aggregate = self.aggregate_for_store(store_id).await?;

        tracing::info!(
            %user_id,
            %store_id,
            rating = rating.rating.get(),
            "rating submitted"
        );

        Ok(RatingSubmission { rating, aggregate })
    }

    async fn update_existing(
        &self,
        user_id: Uuid,
        store_id: Uuid,
        value: RatingValue,
    ) -> DomainResult<Option<Rating>> {
        let Some(existing) = self
            .ratings
            .find_by_user_and_store(user_id, store_id)
            .await
            .map_err(repo_error)?
        else {
            return Ok(None);
        };

        self.ratings
            .update_value(existing.id, value, Utc::now())
            .await
            .map(Some)
            .map_err(repo_error)
    }

    /// Average and count of a store's ratings; `{None, 0}` when unrated
    pub async fn aggregate_for_store(&self, store_id: Uuid) -> DomainResult<StoreAggregate> {
        self.ratings
            .aggregate_for_store(store_id)
            .await
            .map_err(repo_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::Store;
    use crate::infrastructure::repositories::InMemoryDatabase;
    use serde_json::json;

    async fn setup() -> (Arc<InMemoryDatabase>, RatingService, Uuid) {
        let db = Arc::new(InMemoryDatabase::new());
        let store = Store::new("Rated Store", None, None, None).unwrap();
        StoreRepository::create(db.as_ref(), &store).await.unwrap();
        let service = RatingService::new(db.clone(), db.clone());
        (db, service, store.id)
    }

    #[tokio::test]
    async fn unrated_store_aggregate_is_empty() {
        let (_db, service, store_id) = setup().await;
        let agg = service.aggregate_for_store(store_id).await.unwrap();
        assert_eq!(agg, StoreAggregate { average: None, count: 0 });
    }

    #[tokio::test]
    async fn first_submission_inserts() {
        let (db, service, store_id) = setup().await;
        let user_id = Uuid::new_v4();

        let result = service.upsert_rating(user_id, store_id, &json!(4)).await.unwrap();

        assert_eq!(result.rating.rating.get(), 4);
        assert_eq!(result.aggregate, StoreAggregate { average: Some(4.0), count: 1 });
        assert_eq!(RatingRepository::count(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn resubmission_updates_same_row() {
        let (db, service, store_id) = setup().await;
        let user_id = Uuid::new_v4();

        let first = service.upsert_rating(user_id, store_id, &json!(2)).await.unwrap();
        let second = service.upsert_rating(user_id, store_id, &json!(5)).await.unwrap();

        assert_eq!(first.rating.id, second.rating.id);
        assert_eq!(second.rating.rating.get(), 5);
        assert!(second.rating.updated_at >= first.rating.updated_at);
        assert_eq!(second.rating.created_at, first.rating.created_at);
        assert_eq!(second.aggregate, StoreAggregate { average: Some(5.0), count: 1 });
        assert_eq!(RatingRepository::count(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_values_do_not_touch_storage() {
        let (db, service, store_id) = setup().await;
        let user_id = Uuid::new_v4();

        for bad in [json!(0), json!(6), json!(3.5), json!("4"), json!(null)] {
            let err = service.upsert_rating(user_id, store_id, &bad).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{:?}", bad);
        }
        assert_eq!(RatingRepository::count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_store_is_not_found() {
        let (_db, service, _store_id) = setup().await;
        let err = service
            .upsert_rating(Uuid::new_v4(), Uuid::new_v4(), &json!(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_submissions_leave_one_row() {
        let (db, service, store_id) = setup().await;
        let service = Arc::new(service);
        let user_id = Uuid::new_v4();

        let handles: Vec<_> = (1..=5)
            .map(|v| {
                let service = service.clone();
                tokio::spawn(async move { service.upsert_rating(user_id, store_id, &json!(v)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(RatingRepository::count(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn average_over_several_users() {
        let (_db, service, store_id) = setup().await;
        for v in [5, 4, 3] {
            service
                .upsert_rating(Uuid::new_v4(), store_id, &json!(v))
                .await
                .unwrap();
        }
        let agg = service.aggregate_for_store(store_id).await.unwrap();
        assert_eq!(agg, StoreAggregate { average: Some(4.0), count: 3 });
    }
}
