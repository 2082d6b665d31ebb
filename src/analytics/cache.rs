use crate::error::{AppError, AppResult};
use crate::types::{GraphBucket, TimeRange};
use moka::sync::Cache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

/// Graph data cache. Values are serialized JSON strings with a fixed TTL.
pub enum GraphCache {
    Memory(Cache<String, String>),
    Redis {
        conn: ConnectionManager,
        ttl_secs: u64,
    },
}

impl GraphCache {
    pub fn memory(ttl_secs: u64, max_capacity: u64) -> Self {
        GraphCache::Memory(
            Cache::builder()
                .time_to_live(Duration::from_secs(ttl_secs))
                .max_capacity(max_capacity)
                .build(),
        )
    }

    pub async fn redis(url: &str, ttl_secs: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(GraphCache::Redis { conn, ttl_secs })
    }

    pub fn backend(&self) -> &'static str {
        match self {
            GraphCache::Memory(_) => "memory",
            GraphCache::Redis { .. } => "redis",
        }
    }

    /// Key is `"graphData:{from}:{to}"`.
    pub fn cache_key(range: TimeRange) -> String {
        format!("graphData:{}:{}", range.from(), range.to())
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match self {
            GraphCache::Memory(cache) => Ok(cache.get(key)),
            GraphCache::Redis { conn, .. } => {
                let mut conn = conn.clone();
                Ok(conn.get(key).await?)
            }
        }
    }

    pub async fn insert(&self, key: String, value: String) -> AppResult<()> {
        match self {
            GraphCache::Memory(cache) => {
                cache.insert(key, value);
                Ok(())
            }
            GraphCache::Redis { conn, ttl_secs } => {
                let mut conn = conn.clone();
                let _: () = conn.set_ex(key, value, *ttl_secs).await?;
                Ok(())
            }
        }
    }

    /// Serve the bucket series for `range` from cache when the range is closed
    /// at `now_ms`, otherwise run `compute` and store its result.
    ///
    /// Ranges reaching `now_ms` or later can still gain entries, so they are
    /// always recomputed even if a cached value exists. Every computation is
    /// written back; concurrent misses on the same key simply overwrite each
    /// other with equivalent values.
    pub async fn get_or_compute<F, Fut>(
        &self,
        range: TimeRange,
        now_ms: i64,
        compute: F,
    ) -> AppResult<Vec<GraphBucket>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<GraphBucket>>>,
    {
        let key = Self::cache_key(range);

        if range.is_closed_at(now_ms) {
            if let Some(cached) = self.get(&key).await? {
                tracing::debug!(key = %key, "graph data cache hit");
                return serde_json::from_str(&cached)
                    .map_err(|e| AppError::Cache(format!("cache deserialize: {e}")));
            }
        }

        tracing::debug!(key = %key, closed = range.is_closed_at(now_ms), "graph data cache miss");
        let buckets = compute().await?;
        let json_str = serde_json::to_string(&buckets)
            .map_err(|e| AppError::Internal(format!("serialize: {e}")))?;
        self.insert(key, json_str).await?;
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> Vec<GraphBucket> {
        vec![GraphBucket {
            bucket: "2023-10-10 06:00".to_string(),
            total: 3,
            success: 2,
            failure: 1,
            unique_users: 2,
        }]
    }

    async fn counted(calls: &AtomicUsize) -> AppResult<Vec<GraphBucket>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample())
    }

    #[test]
    fn test_cache_key() {
        let range = TimeRange::new(1000, 2000).unwrap();
        assert_eq!(GraphCache::cache_key(range), "graphData:1000:2000");
    }

    #[tokio::test]
    async fn test_closed_range_computed_once() {
        let cache = GraphCache::memory(600, 16);
        let calls = AtomicUsize::new(0);
        let range = TimeRange::new(1000, 2000).unwrap();

        let first = cache
            .get_or_compute(range, 5000, || counted(&calls))
            .await
            .unwrap();
        let second = cache
            .get_or_compute(range, 5001, || counted(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_open_range_never_served_from_cache() {
        let cache = GraphCache::memory(600, 16);
        let calls = AtomicUsize::new(0);
        let range = TimeRange::new(1000, 2000).unwrap();

        // `to == now` is still open
        cache
            .get_or_compute(range, 2000, || counted(&calls))
            .await
            .unwrap();
        cache
            .get_or_compute(range, 1500, || counted(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The entry was written, so once the range closes it is served
        assert!(cache.get("graphData:1000:2000").await.unwrap().is_some());
        cache
            .get_or_compute(range, 2001, || counted(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_ranges_use_distinct_keys() {
        let cache = GraphCache::memory(600, 16);
        let calls = AtomicUsize::new(0);

        for to in [2000, 3000] {
            let range = TimeRange::new(1000, to).unwrap();
            cache
                .get_or_compute(range, 10_000, || counted(&calls))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let cache = GraphCache::memory(600, 16);
        let range = TimeRange::new(1000, 2000).unwrap();

        let result = cache
            .get_or_compute(range, 5000, || async {
                Err::<Vec<GraphBucket>, _>(AppError::Internal("store down".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.get("graphData:1000:2000").await.unwrap().is_none());
        assert_eq!(cache.backend(), "memory");
    }
}
