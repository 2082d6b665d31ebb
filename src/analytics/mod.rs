pub mod cache;
pub mod handler;
pub mod interval;
pub mod range;
pub mod types;

use crate::config::{CacheConfig, QueryConfig};
use cache::GraphCache;
use deadpool_sqlite::Pool;

/// Shared state for analytics endpoints.
pub struct AnalyticsState {
    pub pool: Pool,
    pub cache: GraphCache,
    pub query: QueryConfig,
}

impl AnalyticsState {
    /// Build the state, connecting to Redis when `cache.redis_url` is set and
    /// using the in-process cache otherwise.
    pub async fn new(
        pool: Pool,
        cache_config: &CacheConfig,
        query: QueryConfig,
    ) -> Result<Self, redis::RedisError> {
        let cache = match cache_config.redis_url {
            Some(ref url) => GraphCache::redis(url, cache_config.ttl_secs).await?,
            None => GraphCache::memory(cache_config.ttl_secs, cache_config.max_capacity),
        };
        tracing::info!(backend = cache.backend(), ttl_secs = cache_config.ttl_secs, "graph cache ready");

        Ok(Self { pool, cache, query })
    }
}
