//! Shared handler state: configuration plus injected persistence handles.

use std::sync::Arc;

use sqlx::PgPool;

use crate::application::services::{
    AuthService, RatingService, StatsService, StoreService, UserService,
};
use crate::config::Config;
use crate::domain::repositories::{RatingRepository, StoreRepository, UserRepository};
use crate::infrastructure::repositories::{
    InMemoryDatabase, PostgresRatingRepository, PostgresStoreRepository, PostgresUserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub ratings: Arc<dyn RatingRepository>,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            stores: Arc::new(PostgresStoreRepository::new(pool.clone())),
            ratings: Arc::new(PostgresRatingRepository::new(pool)),
        }
    }

    /// State backed by a fresh in-memory database, for tests and demos
    pub fn in_memory(config: Config) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        Self {
            config: Arc::new(config),
            users: db.clone(),
            stores: db.clone(),
            ratings: db,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.users.clone(),
            self.config.tokens.clone(),
            self.config.bcrypt_cost,
        )
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            self.users.clone(),
            self.stores.clone(),
            self.ratings.clone(),
            self.config.bcrypt_cost,
        )
    }

    pub fn store_service(&self) -> StoreService {
        StoreService::new(self.stores.clone(), self.users.clone(), self.ratings.clone())
    }

    pub fn rating_service(&self) -> RatingService {
        RatingService::new(self.stores.clone(), self.ratings.clone())
    }

    pub fn stats_service(&self) -> StatsService {
        StatsService::new(self.users.clone(), self.stores.clone(), self.ratings.clone())
    }
}
