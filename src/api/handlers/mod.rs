pub mod admin;
pub mod auth;
pub mod stores;
pub mod users;

use serde::Deserialize;

/// `page` and `pageSize` query parameters shared by list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
