//! Integration tests for the PostgreSQL repositories
//!
//! These tests need a reachable database:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test --test repository_integration -- --ignored
//! ```
//!
//! Migrations are applied on connect. Every test creates its own rows with
//! unique emails and removes them afterwards.

use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use store_ratings_api::application::services::RatingService;
use store_ratings_api::domain::pagination::{
    PageLimits, PageRequest, Sort, SortOrder, StoreFilter, StoreQuery, StoreSortField,
};
use store_ratings_api::domain::rating::{Rating, RatingValue, StoreAggregate};
use store_ratings_api::domain::repositories::{
    RatingRepository, RepositoryError, StoreRepository, UserRepository,
};
use store_ratings_api::domain::store::Store;
use store_ratings_api::domain::user::{Email, Role, User};
use store_ratings_api::infrastructure::repositories::{
    PostgresRatingRepository, PostgresStoreRepository, PostgresUserRepository,
};
use uuid::Uuid;

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn unique_email(prefix: &str) -> Email {
    Email::new(format!("{}-{}@test.example.com", prefix, Uuid::new_v4())).unwrap()
}

/// Create a test user
async fn create_test_user(pool: &PgPool, role: Role) -> User {
    let user = User::new("Repository Test User", unique_email("repo"), "hash".into(), None, role);
    PostgresUserRepository::new(pool.clone())
        .create(&user)
        .await
        .expect("Failed to create test user");
    user
}

async fn create_test_store(pool: &PgPool, name: &str, owner_id: Option<Uuid>) -> Store {
    let store = Store::new(name, None, Some("1 Test Street".into()), owner_id).unwrap();
    PostgresStoreRepository::new(pool.clone())
        .create(&store)
        .await
        .expect("Failed to create test store");
    store
}

/// Clean up test data; ratings and store ownership follow the foreign keys
async fn cleanup(pool: &PgPool, user_ids: &[Uuid], store_ids: &[Uuid]) {
    sqlx::query("DELETE FROM stores WHERE id = ANY($1)")
        .bind(store_ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup stores");
    sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup users");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_repository_create_and_find() {
    let pool = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool.clone());
    let user = create_test_user(&pool, Role::StoreOwner).await;

    let by_email = repo.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.role, Role::StoreOwner);

    let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, user.email);

    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());

    cleanup(&pool, &[user.id], &[]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_repository_duplicate_email_fails() {
    let pool = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool.clone());
    let user = create_test_user(&pool, Role::NormalUser).await;

    let duplicate = User::new("Someone Else", user.email.clone(), "hash".into(), None, Role::NormalUser);
    let err = repo.create(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation(_)));

    cleanup(&pool, &[user.id], &[]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_repository_refresh_token_and_password() {
    let pool = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool.clone());
    let user = create_test_user(&pool, Role::NormalUser).await;

    repo.set_refresh_token(user.id, Some("token-1")).await.unwrap();
    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-1"));

    // Changing the password revokes the refresh token
    repo.update_password(user.id, "new-hash").await.unwrap();
    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "new-hash");
    assert_eq!(stored.refresh_token, None);

    cleanup(&pool, &[user.id], &[]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_store_repository_list_filters_and_sorts() {
    let pool = setup_test_db().await;
    let repo = PostgresStoreRepository::new(pool.clone());
    let tag = Uuid::new_v4().simple().to_string();
    let a = create_test_store(&pool, &format!("{} alpha", tag), None).await;
    let b = create_test_store(&pool, &format!("{} beta", tag), None).await;

    let query = StoreQuery {
        filter: StoreFilter {
            name: Some(tag.to_uppercase()),
            address: None,
        },
        sort: Sort {
            field: StoreSortField::Name,
            order: SortOrder::Desc,
        },
        page: PageRequest::new(None, None, PageLimits::ADMIN_STORES),
    };
    let page = repo.list(&query).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, b.id);
    assert_eq!(page.items[1].id, a.id);

    cleanup(&pool, &[], &[a.id, b.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_store_repository_find_by_owner() {
    let pool = setup_test_db().await;
    let repo = PostgresStoreRepository::new(pool.clone());
    let owner = create_test_user(&pool, Role::StoreOwner).await;
    let second = create_test_store(&pool, "Owned B", Some(owner.id)).await;
    let first = create_test_store(&pool, "Owned A", Some(owner.id)).await;

    let stores = repo.find_by_owner(owner.id).await.unwrap();
    let ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    cleanup(&pool, &[owner.id], &[first.id, second.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rating_repository_unique_and_aggregates() {
    let pool = setup_test_db().await;
    let repo = PostgresRatingRepository::new(pool.clone());
    let u1 = create_test_user(&pool, Role::NormalUser).await;
    let u2 = create_test_user(&pool, Role::NormalUser).await;
    let store = create_test_store(&pool, "Rated", None).await;
    let unrated = create_test_store(&pool, "Unrated", None).await;

    repo.insert(&Rating::new(u1.id, store.id, RatingValue::new(4).unwrap()))
        .await
        .unwrap();
    repo.insert(&Rating::new(u2.id, store.id, RatingValue::new(5).unwrap()))
        .await
        .unwrap();

    let err = repo
        .insert(&Rating::new(u1.id, store.id, RatingValue::new(1).unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation(_)));

    let agg = repo.aggregate_for_store(store.id).await.unwrap();
    assert_eq!(agg, StoreAggregate { average: Some(4.5), count: 2 });
    assert_eq!(repo.aggregate_for_store(unrated.id).await.unwrap(), StoreAggregate::EMPTY);

    let map = repo.aggregate_for_stores(&[store.id, unrated.id]).await.unwrap();
    assert_eq!(map.get(&store.id).map(|a| a.count), Some(2));
    assert!(map.get(&unrated.id).is_none());

    let listed = repo.list_for_store(store.id, None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].user.id, u2.id);

    let own = repo
        .find_by_user_for_stores(u1.id, &[store.id, unrated.id])
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].rating.get(), 4);

    cleanup(&pool, &[u1.id, u2.id], &[store.id, unrated.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_upserts_keep_one_row() {
    let pool = setup_test_db().await;
    let user = create_test_user(&pool, Role::NormalUser).await;
    let store = create_test_store(&pool, "Contended", None).await;
    let service = Arc::new(RatingService::new(
        Arc::new(PostgresStoreRepository::new(pool.clone())),
        Arc::new(PostgresRatingRepository::new(pool.clone())),
    ));

    let handles: Vec<_> = (1..=5)
        .map(|v| {
            let service = service.clone();
            let (user_id, store_id) = (user.id, store.id);
            tokio::spawn(async move { service.upsert_rating(user_id, store_id, &json!(v)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let agg = PostgresRatingRepository::new(pool.clone())
        .aggregate_for_store(store.id)
        .await
        .unwrap();
    assert_eq!(agg.count, 1);

    cleanup(&pool, &[user.id], &[store.id]).await;
}
