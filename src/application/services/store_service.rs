//! Store creation, listings and per-store rating views.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::repo_error;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::pagination::{Page, PageRequest, StoreQuery};
use crate::domain::policy::{ensure_can_view_store_ratings, ensure_valid_store_owner, Identity};
use crate::domain::rating::{overall_for_owner, OwnerOverall, RatingWithRater, StoreAggregate};
use crate::domain::repositories::{RatingRepository, StoreRepository, UserRepository};
use crate::domain::store::Store;

/// Input for `POST /admin/stores`
#[derive(Debug, Clone, Default)]
pub struct NewStore {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// Store with its aggregate, as shown in listings
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary {
    pub store: Store,
    pub aggregate: StoreAggregate,
    /// The viewer's own rating; always `None` for anonymous viewers
    pub user_rating: Option<i32>,
}

/// `GET /stores/:id` payload
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDetail {
    pub store: Store,
    pub aggregate: StoreAggregate,
    pub ratings: Vec<RatingWithRater>,
    pub page: PageRequest,
}

/// Full rating list of one store for its owner or an admin
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRatings {
    pub store_id: Uuid,
    pub aggregate: StoreAggregate,
    pub ratings: Vec<RatingWithRater>,
}

/// Stores owned by the caller with per-store and weighted overall ratings
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedStores {
    pub stores: Vec<StoreSummary>,
    pub overall: OwnerOverall,
}

pub struct StoreService {
    stores: Arc<dyn StoreRepository>,
    users: Arc<dyn UserRepository>,
    ratings: Arc<dyn RatingRepository>,
}

impl StoreService {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        users: Arc<dyn UserRepository>,
        ratings: Arc<dyn RatingRepository>,
    ) -> Self {
        Self {
            stores,
            users,
            ratings,
        }
    }

    /// Creates a store; an `owner_id` must name an existing `STORE_OWNER`
    pub async fn create_store(&self, requester: &Identity, new_store: NewStore) -> DomainResult<Store> {
        let store = Store::new(
            new_store.name,
            new_store.email,
            new_store.address,
            new_store.owner_id,
        )?;

        if let Some(owner_id) = store.owner_id {
            let owner = self.users.find_by_id(owner_id).await.map_err(repo_error)?;
            ensure_valid_store_owner(owner.as_ref())?;
        }

        self.stores.create(&store).await.map_err(repo_error)?;

        tracing::info!(
            admin_id = %requester.user_id,
            store_id = %store.id,
            owner_id = ?store.owner_id,
            "admin created store"
        );
        Ok(store)
    }

    /// Paginated stores with aggregates; the viewer's own ratings are
    /// attached when `viewer` is given
    pub async fn list_stores(
        &self,
        query: &StoreQuery,
        viewer: Option<Uuid>,
    ) -> DomainResult<Page<StoreSummary>> {
        let page = self.stores.list(query).await.map_err(repo_error)?;
        let store_ids: Vec<Uuid> = page.items.iter().map(|s| s.id).collect();

        let aggregates = self
            .ratings
            .aggregate_for_stores(&store_ids)
            .await
            .map_err(repo_error)?;

        let own_ratings: HashMap<Uuid, i32> = match viewer {
            Some(user_id) => self
                .ratings
                .find_by_user_for_stores(user_id, &store_ids)
                .await
                .map_err(repo_error)?
                .into_iter()
                .map(|r| (r.store_id, r.rating.get()))
                .collect(),
            None => HashMap::new(),
        };

        Ok(page.map(|store| StoreSummary {
            aggregate: aggregates.get(&store.id).copied().unwrap_or_default(),
            user_rating: own_ratings.get(&store.id).copied(),
            store,
        }))
    }

    /// Store, its aggregate and one page of its ratings, newest first
    pub async fn store_detail(&self, id: Uuid, page: PageRequest) -> DomainResult<StoreDetail> {
        let store = self.find_store(id).await?;
        let aggregate = self
            .ratings
            .aggregate_for_store(id)
            .await
            .map_err(repo_error)?;
        let ratings = self
            .ratings
            .list_for_store(id, Some(page))
            .await
            .map_err(repo_error)?;

        Ok(StoreDetail {
            store,
            aggregate,
            ratings,
            page,
        })
    }

    /// Every rating of a store; restricted to admins and the store's owner
    pub async fn store_ratings(&self, identity: &Identity, store_id: Uuid) -> DomainResult<StoreRatings> {
        let store = self.find_store(store_id).await?;
        ensure_can_view_store_ratings(identity, &store)?;

        let ratings = self
            .ratings
            .list_for_store(store_id, None)
            .await
            .map_err(repo_error)?;
        let aggregate = self
            .ratings
            .aggregate_for_store(store_id)
            .await
            .map_err(repo_error)?;

        Ok(StoreRatings {
            store_id,
            aggregate,
            ratings,
        })
    }

    /// Stores whose `owner_id` is the caller, aggregated in one grouped query
    pub async fn owned_stores(&self, owner_id: Uuid) -> DomainResult<OwnedStores> {
        let stores = self
            .stores
            .find_by_owner(owner_id)
            .await
            .map_err(repo_error)?;
        let store_ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();
        let aggregates = self
            .ratings
            .aggregate_for_stores(&store_ids)
            .await
            .map_err(repo_error)?;

        let stores: Vec<StoreSummary> = stores
            .into_iter()
            .map(|store| StoreSummary {
                aggregate: aggregates.get(&store.id).copied().unwrap_or_default(),
                user_rating: None,
                store,
            })
            .collect();
        let overall = overall_for_owner(stores.iter().map(|s| &s.aggregate));

        Ok(OwnedStores { stores, overall })
    }

    async fn find_store(&self, id: Uuid) -> DomainResult<Store> {
        self.stores
            .find_by_id(id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("Store not found"))
    }
}
