use std::sync::Arc;

use serde::Serialize;

use super::repo_error;
use crate::domain::errors::DomainResult;
use crate::domain::repositories::{RatingRepository, StoreRepository, UserRepository};

/// Dashboard counters for administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

pub struct StatsService {
    users: Arc<dyn UserRepository>,
    stores: Arc<dyn StoreRepository>,
    ratings: Arc<dyn RatingRepository>,
}

impl StatsService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stores: Arc<dyn StoreRepository>,
        ratings: Arc<dyn RatingRepository>,
    ) -> Self {
        Self {
            users,
            stores,
            ratings,
        }
    }

    pub async fn dashboard(&self) -> DomainResult<DashboardStats> {
        let (total_users, total_stores, total_ratings) = tokio::try_join!(
            self.users.count(),
            self.stores.count(),
            self.ratings.count(),
        )
        .map_err(repo_error)?;

        Ok(DashboardStats {
            total_users,
            total_stores,
            total_ratings,
        })
    }
}
