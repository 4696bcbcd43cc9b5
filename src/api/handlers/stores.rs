use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::admin::StoreListParams;
use super::PageParams;
use crate::api::errors::ApiError;
use crate::api::middleware::{AuthUser, OptionalAuthUser};
use crate::api::state::AppState;
use crate::domain::pagination::{PageLimits, PageRequest};
use crate::domain::rating::{Rating, RatingWithRater};
use crate::domain::store::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStoreItem {
    #[serde(flatten)]
    pub store: Store,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
    /// `null` for anonymous callers and stores the caller has not rated
    pub user_submitted_rating: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListResponse {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub stores: Vec<PublicStoreItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetailResponse {
    pub store: Store,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    pub ratings: Vec<RatingWithRater>,
    pub page: u32,
    pub page_size: u32,
}

/// Body of `POST|PUT /stores/:id/rating`
///
/// `rating` stays raw JSON so that strings and fractions are rejected by
/// the rating rules rather than by deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatingRequest {
    pub rating: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub rating: Rating,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRatingsResponse {
    pub store_id: Uuid,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    pub ratings: Vec<RatingWithRater>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoreItem {
    #[serde(flatten)]
    pub store: Store,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoresResponse {
    pub stores: Vec<OwnedStoreItem>,
    pub overall_average_rating: Option<f64>,
    pub overall_rating_count: i64,
}

/// Public store listing, personalized when a valid token is sent
///
/// GET /stores
pub async fn list_stores(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    params: Result<Query<StoreListParams>, QueryRejection>,
) -> Result<Json<StoreListResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.into_query(PageLimits::PUBLIC_STORES)?;

    let page = state
        .store_service()
        .list_stores(&query, viewer.map(|v| v.user_id))
        .await?;

    Ok(Json(StoreListResponse {
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        stores: page
            .items
            .into_iter()
            .map(|s| PublicStoreItem {
                store: s.store,
                avg_rating: s.aggregate.average,
                rating_count: s.aggregate.count,
                user_submitted_rating: s.user_rating,
            })
            .collect(),
    }))
}

/// GET /stores/:id
pub async fn get_store(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<StoreDetailResponse>, ApiError> {
    let Path(id) = id?;
    let Query(params) = params?;
    let page = PageRequest::new(params.page, params.page_size, PageLimits::STORE_RATINGS);

    let detail = state.store_service().store_detail(id, page).await?;

    Ok(Json(StoreDetailResponse {
        store: detail.store,
        average_rating: detail.aggregate.average,
        rating_count: detail.aggregate.count,
        ratings: detail.ratings,
        page: detail.page.page,
        page_size: detail.page.page_size,
    }))
}

/// Create or update the caller's rating of a store
///
/// POST /stores/:id/rating and PUT /stores/:id/rating
pub async fn submit_rating(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
    let Path(store_id) = id?;
    let Json(req) = body?;

    let submission = state
        .rating_service()
        .upsert_rating(identity.user_id, store_id, &req.rating)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            rating: submission.rating,
            average_rating: submission.aggregate.average,
            rating_count: submission.aggregate.count,
        }),
    ))
}

/// Every rating of a store, for its owner or an admin
///
/// GET /stores/:id/ratings
pub async fn store_ratings(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<StoreRatingsResponse>, ApiError> {
    let Path(store_id) = id?;
    let ratings = state
        .store_service()
        .store_ratings(&identity, store_id)
        .await?;

    Ok(Json(StoreRatingsResponse {
        store_id: ratings.store_id,
        average_rating: ratings.aggregate.average,
        rating_count: ratings.aggregate.count,
        ratings: ratings.ratings,
    }))
}

/// Stores owned by the caller
///
/// GET /stores/owner/stores
pub async fn owned_stores(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<OwnedStoresResponse>, ApiError> {
    let owned = state.store_service().owned_stores(identity.user_id).await?;

    Ok(Json(OwnedStoresResponse {
        stores: owned
            .stores
            .into_iter()
            .map(|s| OwnedStoreItem {
                store: s.store,
                average_rating: s.aggregate.average,
                rating_count: s.aggregate.count,
            })
            .collect(),
        overall_average_rating: owned.overall.average,
        overall_rating_count: owned.overall.count,
    }))
}
