//! Paging, filtering and sorting shared by every list endpoint.
//!
//! Sort fields are closed enums: a column name from the query string is
//! parsed here and rejected when it is not on the allow-list, so only
//! known columns ever reach a persistence query.

use serde::Serialize;
use std::str::FromStr;

use crate::domain::errors::DomainError;
use crate::domain::user::Role;

/// Page size bounds for one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl PageLimits {
    pub const ADMIN_USERS: PageLimits = PageLimits { default_size: 20, max_size: 100 };
    pub const ADMIN_STORES: PageLimits = PageLimits { default_size: 20, max_size: 200 };
    pub const PUBLIC_STORES: PageLimits = PageLimits { default_size: 50, max_size: 200 };
    pub const STORE_RATINGS: PageLimits = PageLimits { default_size: 10, max_size: 100 };
}

/// A normalized page request: `page >= 1`, `1 <= page_size <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Clamps raw query values into the endpoint's bounds
    ///
    /// # Example
    /// ```
    /// use store_ratings_api::domain::pagination::{PageLimits, PageRequest};
    ///
    /// let req = PageRequest::new(Some(0), Some(10_000), PageLimits::ADMIN_USERS);
    /// assert_eq!(req.page, 1);
    /// assert_eq!(req.page_size, 100);
    /// ```
    pub fn new(page: Option<u32>, page_size: Option<u32>, limits: PageLimits) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = match page_size {
            Some(0) | None => limits.default_size,
            Some(size) => size.min(limits.max_size),
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        Self {
            total,
            page: request.page,
            page_size: request.page_size,
            items,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DomainError::validation(format!(
                "Invalid sort order: {}",
                other
            ))),
        }
    }
}

/// Sortable user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    Name,
    Email,
    Address,
    Role,
    #[default]
    CreatedAt,
}

impl FromStr for UserSortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "role" => Ok(Self::Role),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            other => Err(DomainError::validation(format!(
                "Cannot sort users by {}",
                other
            ))),
        }
    }
}

/// Sortable store columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreSortField {
    #[default]
    Name,
    Email,
    Address,
    CreatedAt,
}

impl FromStr for StoreSortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            other => Err(DomainError::validation(format!(
                "Cannot sort stores by {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F: FromStr<Err = DomainError> + Default> Sort<F> {
    /// Parses optional raw sort parameters; absent or blank values fall back
    /// to the field's default and ascending order
    pub fn parse(field: Option<&str>, order: Option<&str>) -> Result<Self, DomainError> {
        let field = match field.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => f.parse()?,
            None => F::default(),
        };
        let order = match order.map(str::trim).filter(|o| !o.is_empty()) {
            Some(o) => o.parse()?,
            None => SortOrder::default(),
        };
        Ok(Self { field, order })
    }
}

/// Trims a filter value and drops it when blank
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Case-insensitive substring filters for the admin user list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Exact role match
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub sort: Sort<UserSortField>,
    pub page: PageRequest,
}

/// Case-insensitive substring filters for store lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub filter: StoreFilter,
    pub sort: Sort<StoreSortField>,
    pub page: PageRequest,
}
