use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{admin, auth, stores, users};
use crate::api::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origin == "*" {
        return cors.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            tracing::warn!(%origin, "CORS_ORIGIN is not a valid header value, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}

/// Builds the full HTTP router over the given state
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/", get(auth::root))
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        // Admin routes
        .route("/admin/users", post(admin::create_user).get(admin::list_users))
        .route("/admin/users/:id", get(admin::user_detail))
        .route("/admin/stores", post(admin::create_store).get(admin::list_stores))
        .route("/admin/stats", get(admin::stats))
        // Store routes
        .route("/stores", get(stores::list_stores))
        .route("/stores/owner/stores", get(stores::owned_stores))
        .route("/stores/:id", get(stores::get_store))
        .route(
            "/stores/:id/rating",
            post(stores::submit_rating).put(stores::submit_rating),
        )
        .route("/stores/:id/ratings", get(stores::store_ratings))
        // User routes
        .route("/users/me/password", patch(users::change_password))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
