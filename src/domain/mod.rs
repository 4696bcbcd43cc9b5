// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod pagination;
pub mod policy;
pub mod rating;
pub mod repositories;
pub mod store;
pub mod user;

pub use errors::{DomainError, DomainResult};
