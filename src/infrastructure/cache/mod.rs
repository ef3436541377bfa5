//! Read-through cache in front of the public SmartLink lookups.
//!
//! [`RedisCache`] when `REDIS_URL` (or `REDIS_HOST`) is set and reachable,
//! [`NullCache`] otherwise.

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheKey, CacheService};
