//! In-process implementation of all three repositories.
//!
//! Mirrors the PostgreSQL adapters closely enough to stand in for them in
//! tests: unique email and (user, store) constraints, case-insensitive
//! substring filters, NULLs sorted last on ascending order, and ratings
//! listed newest first.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::pagination::{
    Page, PageRequest, SortOrder, StoreQuery, StoreSortField, UserQuery, UserSortField,
};
use crate::domain::rating::{Rater, Rating, RatingValue, RatingWithRater, StoreAggregate};
use crate::domain::repositories::{
    RatingRepository, RepositoryError, RepositoryResult, StoreRepository, UserRepository,
};
use crate::domain::store::Store;
use crate::domain::user::{Email, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    stores: Vec<Store>,
    ratings: Vec<Rating>,
}

/// Shared in-memory tables implementing every repository trait
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> RepositoryResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Database("in-memory tables poisoned".to_string()))
    }
}

fn contains_ci(haystack: Option<&str>, needle: &Option<String>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

/// Ascending comparison with NULLs last, as PostgreSQL does
fn cmp_nullable(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn paginate<T: Clone>(items: Vec<&T>, page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    Page::new(page, total, items)
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation("users_email_key".to_string()));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn list(&self, query: &UserQuery) -> RepositoryResult<Page<User>> {
        let tables = self.tables()?;
        let filter = &query.filter;
        let mut users: Vec<&User> = tables
            .users
            .iter()
            .filter(|u| contains_ci(Some(&u.name), &filter.name))
            .filter(|u| contains_ci(Some(u.email.as_str()), &filter.email))
            .filter(|u| contains_ci(u.address.as_deref(), &filter.address))
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .collect();

        users.sort_by(|a, b| {
            let ordering = match query.sort.field {
                UserSortField::Name => a.name.cmp(&b.name),
                UserSortField::Email => a.email.as_str().cmp(b.email.as_str()),
                UserSortField::Address => cmp_nullable(a.address.as_deref(), b.address.as_deref()),
                UserSortField::Role => (a.role as u8).cmp(&(b.role as u8)),
                UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering, query.sort.order).then_with(|| a.id.cmp(&b.id))
        });

        Ok(paginate(users, query.page))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let mut tables = self.tables()?;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
            user.refresh_token = None;
        }
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<()> {
        let mut tables = self.tables()?;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.tables()?.users.len() as i64)
    }
}

#[async_trait]
impl StoreRepository for InMemoryDatabase {
    async fn create(&self, store: &Store) -> RepositoryResult<()> {
        self.tables()?.stores.push(store.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Store>> {
        Ok(self.tables()?.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self, query: &StoreQuery) -> RepositoryResult<Page<Store>> {
        let tables = self.tables()?;
        let filter = &query.filter;
        let mut stores: Vec<&Store> = tables
            .stores
            .iter()
            .filter(|s| contains_ci(Some(&s.name), &filter.name))
            .filter(|s| contains_ci(s.address.as_deref(), &filter.address))
            .collect();

        stores.sort_by(|a, b| {
            let ordering = match query.sort.field {
                StoreSortField::Name => a.name.cmp(&b.name),
                StoreSortField::Email => cmp_nullable(a.email.as_deref(), b.email.as_deref()),
                StoreSortField::Address => {
                    cmp_nullable(a.address.as_deref(), b.address.as_deref())
                }
                StoreSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering, query.sort.order).then_with(|| a.id.cmp(&b.id))
        });

        Ok(paginate(stores, query.page))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Store>> {
        let tables = self.tables()?;
        let mut stores: Vec<Store> = tables
            .stores
            .iter()
            .filter(|s| s.is_owned_by(owner_id))
            .cloned()
            .collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(stores)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.tables()?.stores.len() as i64)
    }
}

#[async_trait]
impl RatingRepository for InMemoryDatabase {
    async fn find_by_user_and_store(
        &self,
        user_id: Uuid,
        store_id: Uuid,
    ) -> RepositoryResult<Option<Rating>> {
        Ok(self
            .tables()?
            .ratings
            .iter()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
            .cloned())
    }

    async fn insert(&self, rating: &Rating) -> RepositoryResult<()> {
        let mut tables = self.tables()?;
        if tables
            .ratings
            .iter()
            .any(|r| r.user_id == rating.user_id && r.store_id == rating.store_id)
        {
            return Err(RepositoryError::UniqueViolation(
                "ratings_user_store_key".to_string(),
            ));
        }
        tables.ratings.push(rating.clone());
        Ok(())
    }

    async fn update_value(
        &self,
        id: Uuid,
        value: RatingValue,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Rating> {
        let mut tables = self.tables()?;
        let rating = tables
            .ratings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepositoryError::Database(format!("Rating not found: {}", id)))?;
        rating.rating = value;
        rating.updated_at = updated_at;
        Ok(rating.clone())
    }

    async fn aggregate_for_store(&self, store_id: Uuid) -> RepositoryResult<StoreAggregate> {
        let tables = self.tables()?;
        Ok(StoreAggregate::from_values(
            tables
                .ratings
                .iter()
                .filter(|r| r.store_id == store_id)
                .map(|r| r.rating.get()),
        ))
    }

    async fn aggregate_for_stores(
        &self,
        store_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, StoreAggregate>> {
        let tables = self.tables()?;
        let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
        for rating in tables.ratings.iter().filter(|r| store_ids.contains(&r.store_id)) {
            grouped
                .entry(rating.store_id)
                .or_default()
                .push(rating.rating.get());
        }
        Ok(grouped
            .into_iter()
            .map(|(store_id, values)| (store_id, StoreAggregate::from_values(values)))
            .collect())
    }

    async fn find_by_user_for_stores(
        &self,
        user_id: Uuid,
        store_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Rating>> {
        Ok(self
            .tables()?
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id && store_ids.contains(&r.store_id))
            .cloned()
            .collect())
    }

    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<Vec<RatingWithRater>> {
        let tables = self.tables()?;
        let mut rows: Vec<RatingWithRater> = tables
            .ratings
            .iter()
            .filter(|r| r.store_id == store_id)
            .filter_map(|r| {
                let user = tables.users.iter().find(|u| u.id == r.user_id)?;
                Some(RatingWithRater {
                    id: r.id,
                    rating: r.rating,
                    user_id: r.user_id,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                    user: Rater {
                        id: user.id,
                        name: user.name.clone(),
                        email: user.email.to_string(),
                    },
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(match page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            None => rows,
        })
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.tables()?.ratings.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pagination::{PageLimits, Sort, StoreFilter};
    use crate::domain::user::Role;

    fn user(email: &str) -> User {
        User::new(
            "Memory Test User",
            Email::new(email).unwrap(),
            "hash".to_string(),
            None,
            Role::NormalUser,
        )
    }

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let db = InMemoryDatabase::new();
        UserRepository::create(&db, &user("dup@example.com")).await.unwrap();

        let err = UserRepository::create(&db, &user("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
        assert_eq!(UserRepository::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_rating_is_unique_violation() {
        let db = InMemoryDatabase::new();
        let (user_id, store_id) = (Uuid::new_v4(), Uuid::new_v4());
        let value = RatingValue::new(3).unwrap();

        db.insert(&Rating::new(user_id, store_id, value)).await.unwrap();
        let err = db
            .insert(&Rating::new(user_id, store_id, value))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
        assert_eq!(RatingRepository::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn store_list_filters_case_insensitively_and_sorts_nulls_last() {
        let db = InMemoryDatabase::new();
        for (name, address) in [
            ("Bakery", Some("2 High St")),
            ("bagel bar", None),
            ("Cafe", Some("1 high st")),
        ] {
            let store = Store::new(name, None, address.map(String::from), None).unwrap();
            StoreRepository::create(&db, &store).await.unwrap();
        }

        let query = StoreQuery {
            filter: StoreFilter {
                name: None,
                address: Some("HIGH".to_string()),
            },
            sort: Sort {
                field: StoreSortField::Address,
                order: SortOrder::Asc,
            },
            page: PageRequest::new(None, None, PageLimits::PUBLIC_STORES),
        };
        let page = StoreRepository::list(&db, &query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Cafe");

        let query = StoreQuery {
            filter: StoreFilter::default(),
            sort: Sort {
                field: StoreSortField::Address,
                order: SortOrder::Asc,
            },
            page: PageRequest::new(None, None, PageLimits::PUBLIC_STORES),
        };
        let page = StoreRepository::list(&db, &query).await.unwrap();
        assert_eq!(page.items.last().unwrap().name, "bagel bar");
    }
}
