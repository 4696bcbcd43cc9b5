use thiserror::Error;

/// Errors surfaced by domain rules and application services
///
/// Each variant maps onto exactly one HTTP status in the API layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// No identity attached to the request
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Bearer token absent from the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Token failed verification or expired
    #[error("Invalid token")]
    InvalidToken,

    /// Unknown email or wrong password at login
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; the message is logged, never returned
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
