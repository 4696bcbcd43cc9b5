//! HTTP client for the store-ratings API.
//!
//! Holds the signed-in session, attaches the bearer token to every call and
//! recovers from an expired access token with a single shared refresh.

pub mod api_client;
pub mod refresh;
pub mod session;

pub use api_client::ApiClient;
pub use refresh::{RefreshGuard, RefreshOutcome};
pub use session::{Session, SessionUser};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response; `message` is the server's `error` field
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The access token was rejected and could not be refreshed
    #[error("Session expired")]
    SessionExpired,
}
