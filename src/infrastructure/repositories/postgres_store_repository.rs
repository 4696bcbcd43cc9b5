use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{like_pattern, order_keyword};
use crate::domain::pagination::{Page, StoreFilter, StoreQuery, StoreSortField};
use crate::domain::repositories::{RepositoryResult, StoreRepository};
use crate::domain::store::Store;

const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    address: Option<String>,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Store {
            id: r.id,
            name: r.name,
            email: r.email,
            address: r.address,
            owner_id: r.owner_id,
            created_at: r.created_at,
        }
    }
}

fn sort_column(field: StoreSortField) -> &'static str {
    match field {
        StoreSortField::Name => "name",
        StoreSortField::Email => "email",
        StoreSortField::Address => "address",
        StoreSortField::CreatedAt => "created_at",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &StoreFilter) {
    let mut separator = " WHERE ";
    for (column, value) in [("name", &filter.name), ("address", &filter.address)] {
        if let Some(value) = value {
            qb.push(separator)
                .push(column)
                .push(" ILIKE ")
                .push_bind(like_pattern(value));
            separator = " AND ";
        }
    }
}

/// PostgreSQL implementation of StoreRepository
pub struct PostgresStoreRepository {
    pool: PgPool,
}

impl PostgresStoreRepository {
    /// Creates a new PostgresStoreRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PostgresStoreRepository {
    async fn create(&self, store: &Store) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stores (id, name, email, address, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(store.id)
        .bind(&store.name)
        .bind(&store.email)
        .bind(&store.address)
        .bind(store.owner_id)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Store>> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {} FROM stores WHERE id = $1",
            STORE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    async fn list(&self, query: &StoreQuery) -> RepositoryResult<Page<Store>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stores");
        push_filters(&mut count, &query.filter);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get(0)?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM stores", STORE_COLUMNS));
        push_filters(&mut select, &query.filter);
        select
            .push(" ORDER BY ")
            .push(sort_column(query.sort.field))
            .push(order_keyword(query.sort.order))
            .push(", id LIMIT ")
            .push_bind(query.page.limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows = select
            .build_query_as::<StoreRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            query.page,
            total,
            rows.into_iter().map(Store::from).collect(),
        ))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {} FROM stores WHERE owner_id = $1 ORDER BY name, id",
            STORE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
