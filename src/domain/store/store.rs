use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::user::value_objects::{validate_address, Email};

/// Store aggregate
///
/// # Invariants
/// - Name is non-empty after trimming
/// - Email, when present, is a valid address
/// - Address is at most 400 characters
/// - `owner_id` referenced a `STORE_OWNER` when it was assigned; the store
///   service checks this before calling [`Store::new`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Validates the fields and creates a store with a generated id
    ///
    /// Blank optional fields are treated as absent.
    ///
    /// # Example
    /// ```
    /// use store_ratings_api::domain::store::Store;
    ///
    /// let store = Store::new("Corner Shop", Some("shop@example.com".into()), None, None)
    ///     .expect("valid store");
    /// assert_eq!(store.name, "Corner Shop");
    /// ```
    pub fn new(
        name: impl Into<String>,
        email: Option<String>,
        address: Option<String>,
        owner_id: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Store name cannot be empty"));
        }

        let email = non_blank(email)
            .map(|email| Email::new(email).map(|e| e.as_str().to_string()))
            .transpose()?;
        let address = non_blank(address);
        validate_address(address.as_deref())?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            address,
            owner_id,
            created_at: Utc::now(),
        })
    }

    /// Whether `user_id` owns this store
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
