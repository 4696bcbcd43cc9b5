use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{like_pattern, order_keyword};
use crate::domain::pagination::{Page, UserFilter, UserQuery, UserSortField};
use crate::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use crate::domain::user::{Email, Role, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, address, role, refresh_token, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    address: Option<String>,
    role: Role,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(&r.email)
            .map_err(|e| RepositoryError::Database(format!("Invalid email from database: {}", e)))?;
        Ok(User {
            id: r.id,
            name: r.name,
            email,
            password_hash: r.password_hash,
            address: r.address,
            role: r.role,
            refresh_token: r.refresh_token,
            created_at: r.created_at,
        })
    }
}

fn sort_column(field: UserSortField) -> &'static str {
    match field {
        UserSortField::Name => "name",
        UserSortField::Email => "email",
        UserSortField::Address => "address",
        UserSortField::Role => "role",
        UserSortField::CreatedAt => "created_at",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut separator = " WHERE ";
    for (column, value) in [
        ("name", &filter.name),
        ("email", &filter.email),
        ("address", &filter.address),
    ] {
        if let Some(value) = value {
            qb.push(separator)
                .push(column)
                .push(" ILIKE ")
                .push_bind(like_pattern(value));
            separator = " AND ";
        }
    }
    if let Some(role) = filter.role {
        qb.push(separator).push("role = ").push_bind(role);
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, address, role, refresh_token, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.address)
        .bind(user.role)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, query: &UserQuery) -> RepositoryResult<Page<User>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, &query.filter);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get(0)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
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
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(query.page, total, users))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, refresh_token = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
