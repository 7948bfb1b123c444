//! TTL caches for upstream responses

use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for a per-symbol endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Stock symbol
    pub symbol: String,
    /// Endpoint or operation type
    pub endpoint: &'static str,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, endpoint: &'static str) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint,
        }
    }
}

/// Thread-safe TTL cache
pub struct ResponseCache<V> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a live value
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value or run `fetcher` and cache its result
    ///
    /// With `force` the cache is skipped but the fresh value still replaces
    /// the stored one. Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, force: bool, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if !force {
            if let Some(value) = self.get(&key).await {
                tracing::debug!(?key, "Cache hit");
                return Ok(value);
            }
        }

        tracing::debug!(?key, force, "Cache miss");
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "daily");

        cache.insert(key.clone(), 150.0).await;

        assert_eq!(cache.get(&key).await, Some(150.0));
        assert_eq!(cache.get(&CacheKey::new("AAPL", "sentiment")).await, None);
    }

    #[tokio::test]
    async fn test_get_or_fetch() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "daily");

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), false, || {
                call_count += 1;
                async { Ok::<_, String>(1) }
            })
            .await
            .unwrap();
        assert_eq!(result, 1);

        // Second call should use cache
        let result = cache
            .get_or_fetch(key.clone(), false, || {
                call_count += 1;
                async { Ok::<_, String>(2) }
            })
            .await
            .unwrap();
        assert_eq!(result, 1);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_force_refreshes() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "sentiment");
        cache.insert(key.clone(), 3u8).await;

        let result = cache
            .get_or_fetch(key.clone(), true, || async { Ok::<_, String>(5u8) })
            .await
            .unwrap();
        assert_eq!(result, 5);
        assert_eq!(cache.get(&key).await, Some(5));
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let cache: ResponseCache<u8> = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "daily");

        let result = cache
            .get_or_fetch(key.clone(), false, || async { Err::<u8, _>("down") })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = ResponseCache::new(Duration::from_millis(50));
        let key = CacheKey::new("AAPL", "daily");
        cache.insert(key.clone(), 1).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        for i in 0..5 {
            cache.insert(CacheKey::new(format!("STOCK{i}"), "daily"), i).await;
        }
        assert_eq!(cache.len().await, 5);

        cache.invalidate(&CacheKey::new("STOCK0", "daily")).await;
        assert_eq!(cache.len().await, 4);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
