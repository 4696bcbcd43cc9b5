//! Administrator user management and self-service password change.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::repo_error;
use crate::auth::password::{hash_password, verify_password};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::pagination::{Page, UserQuery};
use crate::domain::policy::{ensure_can_assign_role, Identity};
use crate::domain::rating::{overall_for_owner, StoreAggregate};
use crate::domain::repositories::{
    RatingRepository, RepositoryError, StoreRepository, UserRepository,
};
use crate::domain::user::value_objects::{
    validate_address, validate_admin_user_name, validate_password_policy,
};
use crate::domain::user::{Email, PublicUser, Role, User};

/// Input for `POST /admin/users`
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    /// Raw role name; `None` means `NORMAL_USER`
    pub role: Option<String>,
}

/// Per-store line of a store owner's detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoreRating {
    pub store_id: Uuid,
    pub store_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
}

/// Rating summary attached to a store owner's detail view
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerRatingSummary {
    pub store_ratings: Vec<OwnedStoreRating>,
    pub overall_average_rating: Option<f64>,
    pub overall_rating_count: i64,
}

/// `GET /admin/users/:id` payload
#[derive(Debug, Clone, PartialEq)]
pub struct UserDetail {
    pub user: PublicUser,
    /// Present only for `STORE_OWNER` users
    pub owner: Option<OwnerRatingSummary>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    stores: Arc<dyn StoreRepository>,
    ratings: Arc<dyn RatingRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stores: Arc<dyn StoreRepository>,
        ratings: Arc<dyn RatingRepository>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            stores,
            ratings,
            bcrypt_cost,
        }
    }

    /// Creates a user on behalf of an administrator
    ///
    /// The role-escalation check runs before field validation.
    pub async fn create_user(&self, requester: &Identity, new_user: NewUser) -> DomainResult<PublicUser> {
        let role = match new_user.role.as_deref().map(str::trim) {
            None | Some("") => Role::NormalUser,
            Some(raw) => raw.parse()?,
        };
        ensure_can_assign_role(requester, role)?;

        validate_admin_user_name(&new_user.name)?;
        let email = Email::new(new_user.email)?;
        validate_password_policy(&new_user.password)?;
        let address = new_user
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        validate_address(address.as_deref())?;

        let password_hash = hash_password(&new_user.password, self.bcrypt_cost)
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))?;

        let user = User::new(new_user.name.trim(), email, password_hash, address, role);
        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::UniqueViolation(_) => DomainError::conflict("Email already exists"),
            other => repo_error(other),
        })?;

        tracing::info!(
            admin_id = %requester.user_id,
            user_id = %user.id,
            role = %user.role,
            "admin created user"
        );
        Ok(PublicUser::from(user))
    }

    pub async fn list_users(&self, query: &UserQuery) -> DomainResult<Page<PublicUser>> {
        let page = self.users.list(query).await.map_err(repo_error)?;
        Ok(page.map(PublicUser::from))
    }

    /// User profile, plus store and rating statistics for store owners
    pub async fn user_detail(&self, id: Uuid) -> DomainResult<UserDetail> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let owner = if user.role == Role::StoreOwner {
            Some(self.owner_summary(user.id).await?)
        } else {
            None
        };

        Ok(UserDetail {
            user: PublicUser::from(user),
            owner,
        })
    }

    async fn owner_summary(&self, owner_id: Uuid) -> DomainResult<OwnerRatingSummary> {
        let stores = self
            .stores
            .find_by_owner(owner_id)
            .await
            .map_err(repo_error)?;
        let store_ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();
        let aggregates = self
            .ratings
            .aggregate_for_stores(&store_ids)
            .await
            .map_err(repo_error)?;

        let per_store: Vec<StoreAggregate> = stores
            .iter()
            .map(|s| aggregates.get(&s.id).copied().unwrap_or_default())
            .collect();
        let overall = overall_for_owner(&per_store);

        let store_ratings = stores
            .into_iter()
            .zip(per_store)
            .map(|(store, agg)| OwnedStoreRating {
                store_id: store.id,
                store_name: store.name,
                email: store.email,
                address: store.address,
                avg_rating: agg.average,
                rating_count: agg.count,
            })
            .collect();

        Ok(OwnerRatingSummary {
            store_ratings,
            overall_average_rating: overall.average,
            overall_rating_count: overall.count,
        })
    }

    /// Changes the caller's password and revokes their refresh token
    ///
    /// Wrong current password is `Forbidden`; reusing the current password
    /// or breaking the policy is a `Validation` error.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        if current_password.is_empty() {
            return Err(DomainError::validation("Current password required"));
        }
        validate_password_policy(new_password)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let matches = verify_password(current_password, &user.password_hash)
            .map_err(|e| DomainError::internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(DomainError::forbidden("Current password is incorrect"));
        }
        if current_password == new_password {
            return Err(DomainError::validation(
                "New password must be different from current password",
            ));
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost)
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))?;
        self.users
            .update_password(user.id, &password_hash)
            .await
            .map_err(repo_error)?;

        tracing::info!(%user_id, "password changed");
        Ok(())
    }
}
