//! Store-ratings API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::refresh::{RefreshGuard, RefreshOutcome};
use super::session::{Session, SessionUser};
use super::ClientError;

/// Client for the store-ratings HTTP API
///
/// # Authentication
///
/// After [`login`](Self::login) every request carries the access token as a
/// bearer token. A 401 triggers one refresh through `/auth/refresh`, shared
/// by all requests failing at the same time, and the request is retried once
/// with the new token. A failed refresh signs the session out.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Session>,
    refresh: RefreshGuard,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`, e.g. `http://localhost:4000`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                session: RwLock::new(Session::new()),
                refresh: RefreshGuard::new(),
            }),
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Snapshot of the current session
    pub async fn session(&self) -> Session {
        self.inner.session.read().await.clone()
    }

    /// Restores tokens, e.g. from persisted storage
    pub async fn set_tokens(&self, access_token: &str, refresh_token: &str) {
        self.inner
            .session
            .write()
            .await
            .login(access_token, refresh_token);
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.send_once(Method::POST, "/auth/register", Some(&body), None)
            .await
    }

    /// Signs in and stores the issued tokens
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<SessionUser>, ClientError> {
        let body = json!({ "email": email, "password": password });
        let tokens: TokenResponse = self
            .send_once(Method::POST, "/auth/login", Some(&body), None)
            .await?;

        let mut session = self.inner.session.write().await;
        session.login(tokens.access_token, tokens.refresh_token);
        Ok(session.user().cloned())
    }

    /// Revokes the refresh token server-side and clears the session
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .send::<Value, Value>(Method::POST, "/auth/logout", None)
            .await
            .map(|_| ());
        self.inner.session.write().await.logout();
        result
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// Submits or updates the signed-in user's rating of a store
    pub async fn rate_store(&self, store_id: Uuid, rating: u8) -> Result<Value, ClientError> {
        self.post(&format!("/stores/{}/rating", store_id), &json!({ "rating": rating }))
            .await
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<Value, ClientError> {
        let body = json!({ "currentPassword": current_password, "newPassword": new_password });
        self.patch("/users/me/password", &body).await
    }

    /// Sends an authenticated request, refreshing and retrying once on 401
    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        // Read the generation before the token so a refresh finishing in
        // between is never missed
        let seen_generation = self.inner.refresh.generation();
        let token = self.inner.session.read().await.access_token().map(str::to_string);

        let response = self.execute(method.clone(), path, body, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::parse(response).await;
        }

        tracing::debug!(%path, "request unauthorized, refreshing token");
        let outcome = self
            .inner
            .refresh
            .refresh(seen_generation, || self.refresh_tokens())
            .await;

        match outcome {
            RefreshOutcome::Refreshed(token) => {
                let retry = self.execute(method, path, body, Some(&token)).await?;
                Self::parse(retry).await
            }
            RefreshOutcome::Failed => Err(ClientError::SessionExpired),
        }
    }

    /// Sends a request without the refresh-and-retry handling
    async fn send_once<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        let response = self.execute(method, path, body, token).await?;
        Self::parse(response).await
    }

    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut request = self.inner.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Exchanges the stored refresh token; clears the session on failure
    async fn refresh_tokens(&self) -> Option<String> {
        let refresh_token = self
            .inner
            .session
            .read()
            .await
            .refresh_token()
            .map(str::to_string);

        let result = match refresh_token {
            Some(refresh_token) => {
                let body = json!({ "refreshToken": refresh_token });
                self.send_once::<_, TokenResponse>(Method::POST, "/auth/refresh", Some(&body), None)
                    .await
            }
            None => Err(ClientError::SessionExpired),
        };

        let mut session = self.inner.session.write().await;
        match result {
            Ok(tokens) => {
                session.login(tokens.access_token, tokens.refresh_token);
                session.access_token().map(str::to_string)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, signing out");
                session.logout();
                None
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
