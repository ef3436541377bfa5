//! Repository trait for SmartLink data access.

use crate::domain::entities::{ClickCounters, NewSmartLink, Platform, SmartLink, SmartLinkStatus};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Columns the admin list can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "artist")]
    Artist,
    #[serde(rename = "totalViews")]
    TotalViews,
    #[serde(rename = "totalClicks")]
    TotalClicks,
    #[serde(rename = "publishedAt")]
    PublishedAt,
}

impl SortKey {
    /// Database column backing this key.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Artist => "artist",
            Self::TotalViews => "total_views",
            Self::TotalClicks => "total_clicks",
            Self::PublishedAt => "published_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        })
    }
}

/// Owner-scoped list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartLinkFilter {
    pub owner_id: i64,
    pub status: Option<SmartLinkStatus>,
    /// Case-insensitive substring.
    pub artist: Option<String>,
    /// Case-insensitive substring.
    pub title: Option<String>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

/// One `<url>` of the public sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate numbers for the admin CLI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartLinkTotals {
    pub by_status: Vec<(SmartLinkStatus, i64)>,
    pub total_views: i64,
    pub total_clicks: i64,
}

/// Repository interface for SmartLink records.
///
/// Both `slug` and `short_id` are guarded by unique indexes. Implementations
/// must report a violation of either as [`AppError::identifier_conflict`] so
/// the allocator can retry with fresh identifiers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSmartLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemorySmartLinkRepository`] - in-process store for tests
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmartLinkRepository: Send + Sync {
    /// Inserts a record with already allocated identifiers.
    ///
    /// New records start as `draft` with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] naming the field when `slug` or `short_id` is taken.
    async fn insert(&self, new: NewSmartLink) -> Result<SmartLink, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<SmartLink>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SmartLink>, AppError>;

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<SmartLink>, AppError>;

    /// Whether another record already uses `slug`.
    ///
    /// `exclude_id` skips the record being edited.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn short_id_exists(&self, short_id: &str) -> Result<bool, AppError>;

    /// Lists one page of records matching `filter`.
    ///
    /// `page` is 1-indexed.
    async fn list(
        &self,
        filter: SmartLinkFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<SmartLink>, AppError>;

    async fn count(&self, filter: SmartLinkFilter) -> Result<i64, AppError>;

    /// Persists the editable content of `record` (metadata, slug, platforms,
    /// configuration blocks, visibility, expiry) and bumps `updated_at`.
    ///
    /// Counters, status and ownership are not written.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record no longer exists and
    /// [`AppError::Conflict`] if the new slug is taken.
    async fn update_content(&self, record: SmartLink) -> Result<SmartLink, AppError>;

    /// Stores a status transition.
    async fn set_status(
        &self,
        id: i64,
        status: SmartLinkStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<SmartLink, AppError>;

    /// Hard-deletes a record. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Atomically adds one view and stamps `last_viewed_at`.
    async fn record_view(&self, id: i64) -> Result<(), AppError>;

    /// Atomically adds one click for `platform` and recomputes the conversion rate.
    ///
    /// Returns `None` if the record does not exist.
    async fn record_click(
        &self,
        id: i64,
        platform: Platform,
    ) -> Result<Option<ClickCounters>, AppError>;

    /// Published, public records ordered by `updated_at` descending.
    async fn list_sitemap(&self) -> Result<Vec<SitemapEntry>, AppError>;

    async fn totals(&self) -> Result<SmartLinkTotals, AppError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
