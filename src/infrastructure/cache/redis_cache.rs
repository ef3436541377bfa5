//! Redis cache for published SmartLink records.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

use super::service::{CacheError, CacheKey, CacheService};

const NAMESPACE: &str = "smartlink";

/// Records live under `smartlink:{slug|short}:{id}` and expire after `ttl_seconds`.
///
/// The `ConnectionManager` reconnects on its own; it is cloned per command.
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisCache {
    /// Opens the connection and verifies it with a PING.
    ///
    /// # Errors
    ///
    /// [`CacheError::Config`] for an invalid URL or a zero TTL,
    /// [`CacheError::Unreachable`] when the server cannot be reached.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self, CacheError> {
        if ttl_seconds == 0 {
            return Err(CacheError::Config("TTL must be positive".to_string()));
        }

        let client = Client::open(redis_url).map_err(|e| CacheError::Config(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        let cache = Self { conn, ttl_seconds };
        cache.ping().await?;

        info!(ttl_seconds, "Redis cache ready");
        Ok(cache)
    }

    fn namespaced(key: CacheKey<'_>) -> String {
        format!("{}:{}", NAMESPACE, key)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: CacheKey<'_>) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(Self::namespaced(key)).await {
            Ok(value) => {
                debug!(%key, hit = value.is_some(), "cache lookup");
                value
            }
            Err(e) => {
                warn!(%key, error = %e, "Redis GET failed, treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: CacheKey<'_>, value: &str) {
        let mut conn = self.conn.clone();
        let result = conn
            .set_ex::<_, _, ()>(Self::namespaced(key), value, self.ttl_seconds)
            .await;
        if let Err(e) = result {
            warn!(%key, error = %e, "Redis SET failed");
        }
    }

    async fn evict(&self, keys: &[CacheKey<'_>]) {
        if keys.is_empty() {
            return;
        }

        let names: Vec<String> = keys.iter().copied().map(Self::namespaced).collect();
        let mut conn = self.conn.clone();
        match conn.del::<_, i64>(&names).await {
            Ok(removed) => debug!(removed, "cache eviction"),
            Err(e) => warn!(error = %e, keys = ?names, "Redis DEL failed, entries expire with TTL"),
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.ping::<()>()
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_keys() {
        assert_eq!(
            RedisCache::namespaced(CacheKey::ShortId("ABCD1234")),
            "smartlink:short:ABCD1234"
        );
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected_before_connecting() {
        let err = RedisCache::connect("redis://127.0.0.1:1", 0).await.err();
        assert!(matches!(err, Some(CacheError::Config(_))));
    }
}
