//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Page request parameters from list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    50
}

const MAX_LIMIT: u64 = 100;

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Returns the effective page (at least 1).
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Returns the effective limit, clamped to the maximum.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Returns the row offset for this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }
}

/// A page of results with totals.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page (1-indexed).
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Builds a page response from items and totals.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let limit = request.limit();
        Self {
            items,
            total,
            page: request.page(),
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 50);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest { page: 0, limit: 500 };
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 100);

        let req = PageRequest { page: 3, limit: 20 };
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn test_page_response_totals() {
        let resp = PageResponse::new(vec![1, 2, 3], 101, PageRequest { page: 1, limit: 50 });
        assert_eq!(resp.total_pages, 3);
        assert_eq!(resp.items.len(), 3);
    }
}
