use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::{Email, Role};

/// User record as persisted
///
/// Carries the password hash and the current refresh token, so it is never
/// serialized directly. Read paths convert it into [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub address: Option<String>,
    pub role: Role,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a fresh user record with a generated id
    pub fn new(
        name: impl Into<String>,
        email: Email,
        password_hash: String,
        address: Option<String>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email,
            password_hash,
            address,
            role,
            refresh_token: None,
            created_at: Utc::now(),
        }
    }
}

/// Projection of a user that is safe to return from any endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            address: user.address.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}
