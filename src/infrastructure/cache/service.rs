//! Cache contract for public SmartLink lookups.

use async_trait::async_trait;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unreachable: {0}")]
    Unreachable(String),
    #[error("cache misconfigured: {0}")]
    Config(String),
}

/// The two public lookup paths a record is cached under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    Slug(&'a str),
    ShortId(&'a str),
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slug(slug) => write!(f, "slug:{}", slug),
            Self::ShortId(short_id) => write!(f, "short:{}", short_id),
        }
    }
}

/// Fail-open store of serialized public records.
///
/// Backend failures are logged by the implementation and look like misses to
/// callers, so a broken cache only costs a store lookup. Only [`ping`](Self::ping)
/// reports errors, for the health endpoint.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, key: CacheKey<'_>) -> Option<String>;

    /// Stores `value` with the backend's configured TTL.
    async fn put(&self, key: CacheKey<'_>, value: &str);

    /// Drops every given key. Called after each mutation of a record.
    async fn evict(&self, keys: &[CacheKey<'_>]);

    async fn ping(&self) -> Result<(), CacheError>;

    /// Backend name shown by the health endpoint.
    fn backend(&self) -> &'static str;
}
