use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::pagination::PageRequest;
use crate::domain::rating::{Rater, Rating, RatingValue, RatingWithRater, StoreAggregate};
use crate::domain::repositories::{RatingRepository, RepositoryError, RepositoryResult};

const RATING_COLUMNS: &str = "id, user_id, store_id, rating, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    user_id: Uuid,
    store_id: Uuid,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn rating_value(raw: i32) -> RepositoryResult<RatingValue> {
    RatingValue::new(i64::from(raw))
        .map_err(|_| RepositoryError::Database(format!("Invalid rating from database: {}", raw)))
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(r: RatingRow) -> Result<Self, Self::Error> {
        Ok(Rating {
            id: r.id,
            user_id: r.user_id,
            store_id: r.store_id,
            rating: rating_value(r.rating)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RatingWithRaterRow {
    id: Uuid,
    user_id: Uuid,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
}

impl TryFrom<RatingWithRaterRow> for RatingWithRater {
    type Error = RepositoryError;

    fn try_from(r: RatingWithRaterRow) -> Result<Self, Self::Error> {
        Ok(RatingWithRater {
            id: r.id,
            rating: rating_value(r.rating)?,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: Rater {
                id: r.user_id,
                name: r.user_name,
                email: r.user_email,
            },
        })
    }
}

/// PostgreSQL implementation of RatingRepository
///
/// Aggregates are computed by the database (`AVG`/`COUNT`) on every read;
/// nothing is cached.
pub struct PostgresRatingRepository {
    pool: PgPool,
}

impl PostgresRatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingRepository {
    async fn find_by_user_and_store(
        &self,
        user_id: Uuid,
        store_id: Uuid,
    ) -> RepositoryResult<Option<Rating>> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {} FROM ratings WHERE user_id = $1 AND store_id = $2",
            RATING_COLUMNS
        ))
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Rating::try_from).transpose()
    }

    async fn insert(&self, rating: &Rating) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, user_id, store_id, rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(rating.store_id)
        .bind(rating.rating.get())
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_value(
        &self,
        id: Uuid,
        value: RatingValue,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Rating> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "UPDATE ratings SET rating = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            RATING_COLUMNS
        ))
        .bind(id)
        .bind(value.get())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Database(format!("Rating not found: {}", id)))?;

        Rating::try_from(row)
    }

    async fn aggregate_for_store(&self, store_id: Uuid) -> RepositoryResult<StoreAggregate> {
        let (average, count): (Option<f64>, i64) = sqlx::query_as(
            "SELECT AVG(rating)::FLOAT8, COUNT(*) FROM ratings WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreAggregate { average, count })
    }

    async fn aggregate_for_stores(
        &self,
        store_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, StoreAggregate>> {
        if store_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, Option<f64>, i64)> = sqlx::query_as(
            r#"
            SELECT store_id, AVG(rating)::FLOAT8, COUNT(*)
            FROM ratings
            WHERE store_id = ANY($1)
            GROUP BY store_id
            "#,
        )
        .bind(store_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(store_id, average, count)| (store_id, StoreAggregate { average, count }))
            .collect())
    }

    async fn find_by_user_for_stores(
        &self,
        user_id: Uuid,
        store_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Rating>> {
        if store_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {} FROM ratings WHERE user_id = $1 AND store_id = ANY($2)",
            RATING_COLUMNS
        ))
        .bind(user_id)
        .bind(store_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Rating::try_from).collect()
    }

    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<Vec<RatingWithRater>> {
        // LIMIT NULL means no limit in PostgreSQL
        let (limit, offset) = match page {
            Some(page) => (Some(page.limit()), page.offset()),
            None => (None, 0),
        };

        let rows = sqlx::query_as::<_, RatingWithRaterRow>(
            r#"
            SELECT r.id, r.user_id, r.rating, r.created_at, r.updated_at,
                   u.name AS user_name, u.email AS user_email
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(store_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RatingWithRater::try_from).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
