//! Access policy: which role may perform which action.

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::store::Store;
use crate::domain::user::{Role, User};

/// Caller identity taken from verified token claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::SystemAdmin
    }
}

/// Roles allowed on `/admin` endpoints
pub const ADMIN_ONLY: &[Role] = &[Role::SystemAdmin];

/// Checks that an identity is present and carries one of `allowed`
///
/// # Example
/// ```
/// use store_ratings_api::domain::policy::{authorize, Identity, ADMIN_ONLY};
/// use store_ratings_api::domain::user::Role;
/// use uuid::Uuid;
///
/// let owner = Identity { user_id: Uuid::new_v4(), role: Role::StoreOwner };
/// assert!(authorize(Some(&owner), ADMIN_ONLY).is_err());
/// assert!(authorize(None, ADMIN_ONLY).is_err());
/// ```
pub fn authorize<'a>(
    identity: Option<&'a Identity>,
    allowed: &[Role],
) -> Result<&'a Identity, DomainError> {
    let identity = identity.ok_or(DomainError::Unauthenticated)?;
    if !allowed.contains(&identity.role) {
        return Err(DomainError::forbidden("Forbidden"));
    }
    Ok(identity)
}

/// Only a system admin may create another system admin
pub fn ensure_can_assign_role(requester: &Identity, role: Role) -> Result<(), DomainError> {
    if role == Role::SystemAdmin && requester.role != Role::SystemAdmin {
        return Err(DomainError::forbidden(
            "Only SYSTEM_ADMIN can create another SYSTEM_ADMIN",
        ));
    }
    Ok(())
}

/// A store owner, when given, must exist and hold the `STORE_OWNER` role
pub fn ensure_valid_store_owner(owner: Option<&User>) -> Result<(), DomainError> {
    match owner {
        None => Err(DomainError::validation("ownerId does not exist")),
        Some(user) if user.role != Role::StoreOwner => Err(DomainError::validation(
            "ownerId user is not a STORE_OWNER",
        )),
        Some(_) => Ok(()),
    }
}

/// The raw rating list of a store is visible to admins and to its owner
pub fn ensure_can_view_store_ratings(
    identity: &Identity,
    store: &Store,
) -> Result<(), DomainError> {
    if identity.is_admin() || store.is_owned_by(identity.user_id) {
        return Ok(());
    }
    Err(DomainError::forbidden(
        "Forbidden. Only store owner or admin can view ratings list for this store.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Email;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn user(role: Role) -> User {
        User::new(
            "Policy Test User",
            Email::new("policy@example.com").unwrap(),
            "hash".to_string(),
            None,
            role,
        )
    }

    #[test]
    fn authorize_requires_identity() {
        assert_eq!(
            authorize(None, &[Role::NormalUser]).unwrap_err(),
            DomainError::Unauthenticated
        );
    }

    #[test]
    fn authorize_checks_role() {
        let admin = identity(Role::SystemAdmin);
        let normal = identity(Role::NormalUser);
        assert!(authorize(Some(&admin), ADMIN_ONLY).is_ok());
        assert!(matches!(
            authorize(Some(&normal), ADMIN_ONLY),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn only_admin_creates_admin() {
        assert!(ensure_can_assign_role(&identity(Role::SystemAdmin), Role::SystemAdmin).is_ok());
        assert!(ensure_can_assign_role(&identity(Role::StoreOwner), Role::SystemAdmin).is_err());
        assert!(ensure_can_assign_role(&identity(Role::StoreOwner), Role::NormalUser).is_ok());
    }

    #[test]
    fn store_owner_must_exist_and_be_owner() {
        assert!(ensure_valid_store_owner(None).is_err());
        assert!(ensure_valid_store_owner(Some(&user(Role::NormalUser))).is_err());
        assert!(ensure_valid_store_owner(Some(&user(Role::StoreOwner))).is_ok());
    }

    #[test]
    fn rating_list_visible_to_owner_and_admin_only() {
        let owner = identity(Role::StoreOwner);
        let store = Store::new("Deli", None, None, Some(owner.user_id)).unwrap();

        assert!(ensure_can_view_store_ratings(&owner, &store).is_ok());
        assert!(ensure_can_view_store_ratings(&identity(Role::SystemAdmin), &store).is_ok());
        assert!(ensure_can_view_store_ratings(&identity(Role::StoreOwner), &store).is_err());
        assert!(ensure_can_view_store_ratings(&identity(Role::NormalUser), &store).is_err());
    }
}
