//! Cache used when Redis is not configured or unreachable.

use async_trait::async_trait;

use super::service::{CacheError, CacheKey, CacheService};

/// Misses on every lookup and discards every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get(&self, _key: CacheKey<'_>) -> Option<String> {
        None
    }

    async fn put(&self, _key: CacheKey<'_>, _value: &str) {}

    async fn evict(&self, _keys: &[CacheKey<'_>]) {}

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_are_never_read_back() {
        let cache = NullCache::new();
        cache.put(CacheKey::Slug("a"), "{}").await;
        assert_eq!(cache.get(CacheKey::Slug("a")).await, None);
        assert!(cache.ping().await.is_ok());
    }
}
