use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Maximum length accepted for user and store addresses
pub const MAX_ADDRESS_LEN: usize = 400;

/// Email value object representing a plausible email address
///
/// # Invariants
/// - Exactly one '@' with a non-empty local part
/// - Domain part contains a '.' that is neither first nor last
/// - No whitespace
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Example
    /// ```
    /// use store_ratings_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("test@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "test@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let email = email.into().trim().to_string();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(DomainError::validation(format!("Invalid email: {}", email)))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .find('.')
                .is_some_and(|dot| dot > 0 && !domain.ends_with('.'))
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role attached to every user, gating every access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    NormalUser,
    StoreOwner,
    SystemAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NormalUser => "NORMAL_USER",
            Role::StoreOwner => "STORE_OWNER",
            Role::SystemAdmin => "SYSTEM_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL_USER" => Ok(Role::NormalUser),
            "STORE_OWNER" => Ok(Role::StoreOwner),
            "SYSTEM_ADMIN" => Ok(Role::SystemAdmin),
            other => Err(DomainError::validation(format!("Invalid role: {}", other))),
        }
    }
}

/// Name rule for self-registration: at least 3 characters
pub fn validate_registration_name(name: &str) -> Result<(), DomainError> {
    if name.trim().chars().count() < 3 {
        return Err(DomainError::validation(
            "Name must be at least 3 characters",
        ));
    }
    Ok(())
}

/// Name rule for users created by an administrator: 20 to 60 characters
pub fn validate_admin_user_name(name: &str) -> Result<(), DomainError> {
    let len = name.trim().chars().count();
    if !(20..=60).contains(&len) {
        return Err(DomainError::validation("Name must be 20-60 chars"));
    }
    Ok(())
}

/// Minimum rule applied at self-registration
pub fn validate_registration_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < 8 {
        return Err(DomainError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Full password policy: 8-16 characters, one uppercase letter and one
/// character that is not a letter, digit or underscore
pub fn validate_password_policy(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if !(8..=16).contains(&len) {
        return Err(DomainError::validation("Password must be 8-16 chars"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::validation(
            "Must contain an uppercase letter",
        ));
    }
    if !password.chars().any(|c| !c.is_alphanumeric() && c != '_') {
        return Err(DomainError::validation(
            "Must contain a special character",
        ));
    }
    Ok(())
}

/// Optional address, at most [`MAX_ADDRESS_LEN`] characters
pub fn validate_address(address: Option<&str>) -> Result<(), DomainError> {
    match address {
        Some(address) if address.chars().count() > MAX_ADDRESS_LEN => Err(
            DomainError::validation("Address must be at most 400 characters"),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email() {
        assert!(Email::new("test@example.com").is_ok());
    }

    #[test]
    fn valid_email_with_subdomain() {
        assert!(Email::new("user@mail.example.com").is_ok());
    }

    #[test]
    fn email_is_trimmed() {
        let email = Email::new("  a@b.com ").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[test]
    fn invalid_email_no_at_symbol() {
        assert!(Email::new("invalid").is_err());
    }

    #[test]
    fn invalid_email_without_domain_dot() {
        assert!(Email::new("a@b").is_err());
        assert!(Email::new("a@b.").is_err());
        assert!(Email::new("a@.com").is_err());
    }

    #[test]
    fn invalid_email_empty_local_part() {
        assert!(Email::new("@example.com").is_err());
    }

    #[test]
    fn invalid_email_double_at() {
        assert!(Email::new("a@b@example.com").is_err());
    }

    #[test]
    fn role_round_trips_through_wire_name() {
        for role in [Role::NormalUser, Role::StoreOwner, Role::SystemAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Role::StoreOwner).unwrap();
        assert_eq!(json, "\"STORE_OWNER\"");
    }

    #[test]
    fn registration_name_needs_three_chars() {
        assert!(validate_registration_name("Al").is_err());
        assert!(validate_registration_name("Ali").is_ok());
    }

    #[test]
    fn admin_name_bounds() {
        assert!(validate_admin_user_name(&"a".repeat(19)).is_err());
        assert!(validate_admin_user_name(&"a".repeat(20)).is_ok());
        assert!(validate_admin_user_name(&"a".repeat(60)).is_ok());
        assert!(validate_admin_user_name(&"a".repeat(61)).is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password_policy("Secret!1").is_ok());
        assert!(validate_password_policy("Sh0rt!").is_err());
        assert!(validate_password_policy("WayTooLongPassword!").is_err());
        assert!(validate_password_policy("nouppercase!").is_err());
        assert!(validate_password_policy("NoSpecial1").is_err());
        assert!(validate_password_policy("Under_score1").is_err());
    }

    #[test]
    fn address_limit() {
        assert!(validate_address(None).is_ok());
        assert!(validate_address(Some(&"x".repeat(400))).is_ok());
        assert!(validate_address(Some(&"x".repeat(401))).is_err());
    }
}
