// JWT token creation and verification
// Access tokens are short-lived and carry the role; refresh tokens are
// long-lived, signed with a separate secret and stored on the user row

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::policy::Identity;
use crate::domain::user::Role;

/// Access token claims
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `role` - Role at issue time
/// * `email` - Convenience for clients rendering the signed-in user
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            role: self.role,
        }
    }
}

/// Refresh token claims
///
/// `jti` makes every issued refresh token distinct, so rotation always
/// invalidates the previous one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub exp: usize,
}

fn expiry(ttl: Duration) -> usize {
    (Utc::now() + ttl).timestamp().max(0) as usize
}

/// Creates a signed access token
///
/// # Example
/// ```
/// use chrono::Duration;
/// use store_ratings_api::auth::jwt::{create_access_token, verify_access_token};
/// use store_ratings_api::domain::user::Role;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_access_token(user_id, Role::NormalUser, "a@b.com", "secret", Duration::minutes(15))
///     .expect("valid token");
/// let claims = verify_access_token(&token, "secret").expect("valid claims");
/// assert_eq!(claims.sub, user_id);
/// ```
pub fn create_access_token(
    user_id: Uuid,
    role: Role,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id,
        role,
        email: email.to_string(),
        exp: expiry(ttl),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verifies signature and expiry of an access token
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Creates a signed refresh token
pub fn create_refresh_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, Error> {
    let claims = RefreshClaims {
        sub: user_id,
        jti: Uuid::new_v4(),
        exp: expiry(ttl),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verifies signature and expiry of a refresh token
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, Error> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    fn access(user_id: Uuid) -> String {
        create_access_token(
            user_id,
            Role::StoreOwner,
            "owner@example.com",
            TEST_SECRET,
            Duration::minutes(15),
        )
        .expect("valid token")
    }

    #[test]
    fn create_and_verify_access_token() {
        let user_id = Uuid::new_v4();
        let claims = verify_access_token(&access(user_id), TEST_SECRET).expect("valid verification");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::StoreOwner);
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(
            claims.identity(),
            Identity {
                user_id,
                role: Role::StoreOwner
            }
        );
    }

    #[test]
    fn wrong_secret_fails() {
        let result = verify_access_token(&access(Uuid::new_v4()), "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_token_fails() {
        assert!(verify_access_token("invalid.token.string", TEST_SECRET).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let token = create_access_token(
            Uuid::new_v4(),
            Role::NormalUser,
            "late@example.com",
            TEST_SECRET,
            Duration::hours(-2),
        )
        .unwrap();
        assert!(verify_access_token(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn token_expiry_set() {
        let claims = verify_access_token(&access(Uuid::new_v4()), TEST_SECRET).unwrap();
        let expiry_time = claims.exp as i64;
        let now = Utc::now().timestamp();
        let in_15_minutes = (Utc::now() + Duration::minutes(15)).timestamp();

        assert!(expiry_time > now);
        assert!(expiry_time <= in_15_minutes + 10);
    }

    #[test]
    fn refresh_tokens_are_unique_and_verifiable() {
        let user_id = Uuid::new_v4();
        let first = create_refresh_token(user_id, TEST_SECRET, Duration::days(7)).unwrap();
        let second = create_refresh_token(user_id, TEST_SECRET, Duration::days(7)).unwrap();
        assert_ne!(first, second);

        let claims = verify_refresh_token(&first, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        assert!(verify_refresh_token(&access(Uuid::new_v4()), TEST_SECRET).is_err());
    }
}
