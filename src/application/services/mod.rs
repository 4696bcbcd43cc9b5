pub mod auth_service;
pub mod rating_service;
pub mod stats_service;
pub mod store_service;
pub mod user_service;

pub use auth_service::{AuthService, Registration, TokenPair};
pub use rating_service::{RatingService, RatingSubmission};
pub use stats_service::{DashboardStats, StatsService};
pub use store_service::{NewStore, OwnedStores, StoreDetail, StoreRatings, StoreService, StoreSummary};
pub use user_service::{NewUser, OwnedStoreRating, OwnerRatingSummary, UserDetail, UserService};

use crate::domain::errors::DomainError;
use crate::domain::repositories::RepositoryError;

/// Maps a persistence failure onto the domain taxonomy
///
/// Call sites that expect a specific unique violation match on it first;
/// anything reaching here is unexpected.
pub fn repo_error(err: RepositoryError) -> DomainError {
    match err {
        RepositoryError::UniqueViolation(constraint) => {
            DomainError::conflict(format!("Duplicate value violates {}", constraint))
        }
        RepositoryError::Database(message) => {
            tracing::error!(error = %message, "repository failure");
            DomainError::internal(message)
        }
    }
}
