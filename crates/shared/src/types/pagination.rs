//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Builds a page request from optional query values, clamping to sane bounds.
    #[must_use]
    pub fn from_query(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page).max(1),
            limit: limit.unwrap_or_else(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// One page of rows plus the total number of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    /// The rows of the current page.
    pub rows: Vec<T>,
    /// Total number of rows across all pages.
    pub total_count: u64,
}

impl<T> Paged<T> {
    /// Creates a new page.
    #[must_use]
    pub fn new(rows: Vec<T>, total_count: u64) -> Self {
        Self { rows, total_count }
    }

    /// Transforms every row, keeping the total.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            rows: self.rows.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}

/// Pagination metadata returned alongside list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number.
    pub page: u64,
    /// Items per page.
    pub limit: u64,
}

impl Pager {
    /// Creates pager metadata for a request and its total.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
