// Password hashing utilities
// Uses bcrypt; the work factor comes from configuration

use bcrypt::{hash, verify, BcryptError};

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use store_ratings_api::auth::password::hash_password;
///
/// let hash = hash_password("my_password", 4).expect("valid hash");
/// assert!(hash.starts_with("$2"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

/// Verifies a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, BcryptError> {
    verify(password, hash)
}
