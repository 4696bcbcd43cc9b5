// Repository ports (persistence gateway)
// Implementations live in infrastructure::repositories

pub mod rating_repository;
pub mod store_repository;
pub mod user_repository;

pub use rating_repository::RatingRepository;
pub use store_repository::StoreRepository;
pub use user_repository::UserRepository;

use thiserror::Error;

/// Failure reported by a persistence adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
