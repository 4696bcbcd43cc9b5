// Rating domain module
// Rating rows, the 1-5 value object, and derived aggregates

#![allow(clippy::module_inception)]

pub mod aggregate;
pub mod rating;

pub use aggregate::{overall_for_owner, OwnerOverall, StoreAggregate};
pub use rating::{Rater, Rating, RatingValue, RatingWithRater};
