//! Contract for the third-party link resolution service.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::PlatformLink;
use crate::error::AppError;

/// Track metadata and platform links resolved from one source URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub isrc: Option<String>,
    pub page_url: Option<String>,
    pub platforms: Vec<PlatformLink>,
}

/// Resolves a streaming URL into the same track on other platforms.
///
/// Failures map to [`AppError::NotFound`] (unknown track),
/// [`AppError::RateLimited`] (upstream throttling) or [`AppError::Internal`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformLookup: Send + Sync {
    async fn lookup(&self, source_url: &str, country: &str) -> Result<LookupResult, AppError>;
}
