//! Client-side session state.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::domain::user::Role;

/// Signed-in user as read from the access token payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Tokens and identity of the signed-in user
///
/// The identity is decoded from the access token without verifying the
/// signature; the server remains the authority on every request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<SessionUser>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a token pair and the identity it carries
    ///
    /// An access token whose payload cannot be read leaves the session
    /// anonymous.
    pub fn login(&mut self, access_token: impl Into<String>, refresh_token: impl Into<String>) {
        let access_token = access_token.into();
        match decode_unverified(&access_token) {
            Some(claims) => {
                self.user = Some(SessionUser {
                    id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                });
                self.access_token = Some(access_token);
                self.refresh_token = Some(refresh_token.into());
            }
            None => {
                tracing::debug!("access token payload unreadable, staying anonymous");
                self.logout();
            }
        }
    }

    pub fn logout(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Route-guard check: signed in with one of `roles`
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| roles.contains(&user.role))
    }
}

fn decode_unverified(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}
