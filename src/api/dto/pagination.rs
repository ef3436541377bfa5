//! Pagination and list query parameters.

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::entities::SmartLinkStatus;
use crate::domain::repositories::{SmartLinkFilter, SortKey, SortOrder};
use crate::error::AppError;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Keeps `(page - 1) * limit` well inside `i64`.
pub const MAX_PAGE: i64 = 1_000_000;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse numbers from query strings.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Returns `(page, limit)` with defaults applied.
    ///
    /// # Validation
    ///
    /// - Page must be between 1 and [`MAX_PAGE`]
    /// - Limit must be between 1 and 100
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if !(1..=MAX_PAGE).contains(&page) {
            return Err(AppError::bad_request(
                format!("Page must be between 1 and {}", MAX_PAGE),
                json!({ "page": page }),
            ));
        }

        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT),
                json!({ "limit": limit }),
            ));
        }

        Ok((page, limit))
    }
}

/// Query parameters of `GET /api/smartlinks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSmartLinksQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub status: Option<SmartLinkStatus>,

    pub artist: Option<String>,

    pub title: Option<String>,

    #[serde(default)]
    pub sort_by: SortKey,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListSmartLinksQuery {
    /// Filter scoped to `owner_id`. Blank substrings are ignored.
    pub fn filter(&self, owner_id: i64) -> SmartLinkFilter {
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        SmartLinkFilter {
            owner_id,
            status: self.status,
            artist: non_blank(&self.artist),
            title: non_blank(&self.title),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// Pagination block of list responses.
#[derive(Debug, Serialize, PartialEq)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PaginationParams {
        PaginationParams { page, limit }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(params(None, None).resolve().unwrap(), (1, 10));
    }

    #[test]
    fn test_custom_page_and_limit() {
        assert_eq!(params(Some(3), Some(50)).resolve().unwrap(), (3, 50));
    }

    #[test]
    fn test_page_zero_is_error() {
        assert!(params(Some(0), None).resolve().is_err());
    }

    #[test]
    fn test_page_upper_bound() {
        assert!(params(Some(MAX_PAGE), Some(MAX_PAGE_LIMIT)).resolve().is_ok());
        assert!(params(Some(MAX_PAGE + 1), None).resolve().is_err());
        assert!(params(Some(i64::MAX), Some(10)).resolve().is_err());
    }

    #[test]
    fn test_limit_bounds() {
        assert!(params(None, Some(0)).resolve().is_err());
        assert!(params(None, Some(1)).resolve().is_ok());
        assert!(params(None, Some(100)).resolve().is_ok());
        assert!(params(None, Some(101)).resolve().is_err());
    }

    #[test]
    fn test_page_meta() {
        assert_eq!(PageMeta::new(1, 10, 0).pages, 0);
        assert_eq!(PageMeta::new(1, 10, 10).pages, 1);
        assert_eq!(PageMeta::new(2, 10, 11).pages, 2);
    }

    #[test]
    fn test_filter_drops_blank_substrings() {
        let query = ListSmartLinksQuery {
            artist: Some("  ".into()),
            title: Some(" night ".into()),
            ..Default::default()
        };
        let filter = query.filter(7);
        assert_eq!(filter.owner_id, 7);
        assert_eq!(filter.artist, None);
        assert_eq!(filter.title.as_deref(), Some("night"));
        assert_eq!(filter.sort_by, SortKey::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }
}
