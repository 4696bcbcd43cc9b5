// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_rating_repository;
pub mod postgres_store_repository;
pub mod postgres_user_repository;

pub use in_memory::InMemoryDatabase;
pub use postgres_rating_repository::PostgresRatingRepository;
pub use postgres_store_repository::PostgresStoreRepository;
pub use postgres_user_repository::PostgresUserRepository;

use crate::domain::pagination::SortOrder;
use crate::domain::repositories::RepositoryError;

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::UniqueViolation(
                db.constraint().unwrap_or("unique").to_string(),
            ),
            _ => RepositoryError::Database(e.to_string()),
        }
    }
}

/// `%value%` with LIKE metacharacters escaped, for use with ILIKE
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn order_keyword(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => " ASC",
        SortOrder::Desc => " DESC",
    }
}
