use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AdminUser;
use crate::api::state::AppState;
use crate::application::services::{DashboardStats, NewStore, NewUser, OwnedStoreRating};
use crate::domain::pagination::{
    non_blank, PageLimits, PageRequest, Sort, StoreFilter, StoreQuery, UserFilter, UserQuery,
};
use crate::domain::store::Store;
use crate::domain::user::{PublicUser, Role};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub store: Store,
}

/// Query string of `GET /admin/users`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(alias = "sortField")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_dir: Option<String>,
}

/// Query string of the store listings (`GET /admin/stores`, `GET /stores`)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListParams {
    pub name: Option<String>,
    pub address: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl StoreListParams {
    pub fn into_query(self, limits: PageLimits) -> Result<StoreQuery, ApiError> {
        Ok(StoreQuery {
            sort: Sort::parse(self.sort_by.as_deref(), self.sort_dir.as_deref())?,
            page: PageRequest::new(self.page, self.page_size, limits),
            filter: StoreFilter {
                name: non_blank(self.name),
                address: non_blank(self.address),
            },
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStoreItem {
    #[serde(flatten)]
    pub store: Store,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStoreListResponse {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub stores: Vec<AdminStoreItem>,
}

#[derive(Debug, Serialize)]
pub struct OwnedStoreItem {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// User profile; the rating fields appear only for store owners
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<OwnedStoreItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_ratings: Option<Vec<OwnedStoreRating>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_average_rating: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_rating_count: Option<i64>,
}

/// Create a user with any role
///
/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(req) = body?;

    let user = state
        .user_service()
        .create_user(
            &admin,
            NewUser {
                name: req.name,
                email: req.email,
                password: req.password,
                address: req.address,
                role: req.role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Create a store, optionally assigned to a store owner
///
/// POST /admin/stores
pub async fn create_store(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Result<Json<CreateStoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let Json(req) = body?;

    let store = state
        .store_service()
        .create_store(
            &admin,
            NewStore {
                name: req.name,
                email: req.email,
                address: req.address,
                owner_id: req.owner_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(StoreResponse { store })))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    params: Result<Query<UserListParams>, QueryRejection>,
) -> Result<Json<UserListResponse>, ApiError> {
    let Query(params) = params?;

    let role = non_blank(params.role)
        .map(|r| r.parse::<Role>())
        .transpose()?;
    let query = UserQuery {
        sort: Sort::parse(params.sort_by.as_deref(), params.sort_dir.as_deref())?,
        page: PageRequest::new(params.page, params.page_size, PageLimits::ADMIN_USERS),
        filter: UserFilter {
            name: non_blank(params.name),
            email: non_blank(params.email),
            address: non_blank(params.address),
            role,
        },
    };

    let page = state.user_service().list_users(&query).await?;
    Ok(Json(UserListResponse {
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        users: page.items,
    }))
}

/// GET /admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    params: Result<Query<StoreListParams>, QueryRejection>,
) -> Result<Json<AdminStoreListResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.into_query(PageLimits::ADMIN_STORES)?;

    let page = state.store_service().list_stores(&query, None).await?;
    Ok(Json(AdminStoreListResponse {
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        stores: page
            .items
            .into_iter()
            .map(|s| AdminStoreItem {
                store: s.store,
                average_rating: s.aggregate.average,
                rating_count: s.aggregate.count,
            })
            .collect(),
    }))
}

/// GET /admin/stats
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.stats_service().dashboard().await?))
}

/// GET /admin/users/:id
pub async fn user_detail(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let Path(id) = id?;
    let detail = state.user_service().user_detail(id).await?;

    let response = match detail.owner {
        Some(summary) => UserDetailResponse {
            user: detail.user,
            stores: Some(
                summary
                    .store_ratings
                    .iter()
                    .map(|s| OwnedStoreItem {
                        id: s.store_id,
                        name: s.store_name.clone(),
                        email: s.email.clone(),
                        address: s.address.clone(),
                    })
                    .collect(),
            ),
            store_ratings: Some(summary.store_ratings),
            overall_average_rating: Some(summary.overall_average_rating),
            overall_rating_count: Some(summary.overall_rating_count),
        },
        None => UserDetailResponse {
            user: detail.user,
            stores: None,
            store_ratings: None,
            overall_average_rating: None,
            overall_rating_count: None,
        },
    };

    Ok(Json(response))
}
