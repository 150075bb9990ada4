//! Offset-based pagination utilities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size when the client does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Error type for page parameter validation.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page must be 1 or greater")]
    InvalidPage,
    #[error("limit must be between 1 and 100")]
    InvalidLimit,
}

/// Raw pagination query parameters (1-based page).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Effective page number, defaulting to 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Effective page size, defaulting to [`DEFAULT_PAGE_LIMIT`].
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    /// Validates that page and limit lie within the accepted ranges.
    pub fn validate(&self) -> Result<(), PageError> {
        if self.page() < 1 {
            return Err(PageError::InvalidPage);
        }
        if self.limit() < 1 || self.limit() > MAX_PAGE_LIMIT {
            return Err(PageError::InvalidLimit);
        }
        Ok(())
    }

    /// SQL offset for the effective page.
    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.limit() as i64
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    /// Builds page metadata for a total row count.
    pub fn new(params: &PageParams, total: i64) -> Self {
        let page = params.page();
        let limit = params.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit as i64 - 1) / limit as i64
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: (page as i64) < total_pages,
            has_prev: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, limit: Option<u32>) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn test_defaults() {
        let p = params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(p.offset(), 0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_offset_math() {
        let p = params(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_zero_page_rejected() {
        let p = params(Some(0), None);
        assert!(matches!(p.validate(), Err(PageError::InvalidPage)));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let p = params(None, Some(0));
        assert!(matches!(p.validate(), Err(PageError::InvalidLimit)));
    }

    #[test]
    fn test_limit_at_maximum_accepted() {
        let p = params(None, Some(MAX_PAGE_LIMIT));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_limit_above_maximum_rejected() {
        let p = params(None, Some(MAX_PAGE_LIMIT + 1));
        assert!(matches!(p.validate(), Err(PageError::InvalidLimit)));
    }

    #[test]
    fn test_page_info_exact_division() {
        let info = PageInfo::new(&params(Some(2), Some(10)), 30);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn test_page_info_partial_last_page() {
        let info = PageInfo::new(&params(Some(4), Some(10)), 31);
        assert_eq!(info.total_pages, 4);
        assert!(!info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn test_page_info_empty_result() {
        let info = PageInfo::new(&params(Some(1), Some(10)), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn test_page_info_first_page() {
        let info = PageInfo::new(&params(Some(1), Some(10)), 25);
        assert!(info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn test_page_params_deserialize_from_query() {
        let p: PageParams = serde_json::from_str(r#"{"page": 2, "limit": 50}"#).unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 50);
    }
}
