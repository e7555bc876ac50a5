//! Caching layer for scraped headlines to avoid hitting the page every cycle

use crate::api::Headline;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Thread-safe, time-bounded cache of headlines keyed by symbol
pub struct HeadlineCache {
    cache: Arc<RwLock<TimedCache<String, Headline>>>,
}

impl HeadlineCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, symbol: &str) -> Option<Headline> {
        // TimedCache evicts on read, hence the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(symbol).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, symbol: impl Into<String>, headline: Headline) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(symbol.into(), headline);
    }

    /// Get or fetch a headline using the provided fetcher.
    ///
    /// Errors are returned to the caller and never cached, so the next
    /// cycle tries again.
    pub async fn get_or_fetch<F, Fut, E>(&self, symbol: &str, fetcher: F) -> Result<Headline, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Headline, E>>,
    {
        if let Some(headline) = self.get(symbol).await {
            tracing::debug!(symbol, "headline cache hit");
            return Ok(headline);
        }

        tracing::debug!(symbol, "headline cache miss");

        let headline = fetcher().await?;
        self.insert(symbol, headline.clone()).await;

        Ok(headline)
    }
}

impl Clone for HeadlineCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn headline(text: &str, sentiment: f64) -> Headline {
        Headline {
            text: text.to_string(),
            sentiment,
        }
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = HeadlineCache::new(Duration::from_secs(60));
        let value = headline("Apple beats estimates", 0.4);

        cache.insert("AAPL", value.clone()).await;

        assert_eq!(cache.get("AAPL").await, Some(value));
        assert_eq!(cache.get("MSFT").await, None);
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = HeadlineCache::new(Duration::from_secs(60));
        let value = headline("Tesla recalls vehicles", -0.3);
        let calls = AtomicUsize::new(0);

        let fetcher = || {
            calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            async move { Ok::<_, String>(value) }
        };

        let result = cache.get_or_fetch("TSLA", fetcher).await.unwrap();
        assert_eq!(result, value);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second call should use cache
        let result = cache.get_or_fetch("TSLA", fetcher).await.unwrap();
        assert_eq!(result, value);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_errors() {
        let cache = HeadlineCache::new(Duration::from_secs(60));

        let result = cache
            .get_or_fetch("KO", || async { Err::<Headline, _>("timeout".to_string()) })
            .await;
        assert!(result.is_err());
        assert!(cache.get("KO").await.is_none());
    }
}
