/// Page caching layer
///
/// The rendered global feed is cached for a fixed time-to-live. Entries are
/// never invalidated by writes: a new or deleted post shows up in the cached
/// page only once the entry expires.
///
/// Keys are derived from the view name and the request's query parameters:
/// `page_cache:v1:{view}:{sha256(sorted query pairs)}`.
pub mod memory_page_cache;
pub mod redis_page_cache;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::metrics::feed::PAGE_CACHE_EVENTS;

pub use memory_page_cache::MemoryPageCache;
pub use redis_page_cache::RedisPageCache;

pub const PAGE_CACHE_PREFIX: &str = "page_cache:v1:";

/// Storage backend for rendered pages.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, body: &str, ttl: Duration) -> Result<()>;

    /// Drop every cached page.
    async fn clear(&self) -> Result<()>;

    /// Health check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Derive a cache key from a view name and a raw query string.
///
/// Parameter order does not matter: `a=1&page=2` and `page=2&a=1` share a key.
pub fn page_cache_key(view: &str, query_string: &str) -> String {
    let mut pairs: Vec<&str> = query_string.split('&').filter(|p| !p.is_empty()).collect();
    pairs.sort_unstable();

    let digest = Sha256::digest(pairs.join("&").as_bytes());
    format!("{}{}:{}", PAGE_CACHE_PREFIX, view, hex::encode(digest))
}

/// Time-bounded cache of rendered pages, injected into the feed composer.
#[derive(Clone)]
pub struct PageCacheService {
    backend: Arc<dyn PageCache>,
    ttl: Duration,
}

impl PageCacheService {
    pub fn new(backend: Arc<dyn PageCache>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Return the cached body for `key`, or render, store and return it.
    ///
    /// Cache failures degrade to rendering; they never fail the request.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        match self.backend.get(key).await {
            Ok(Some(body)) => {
                PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                debug!(key, "page cache HIT");
                return Ok(body);
            }
            Ok(None) => {
                PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                debug!(key, "page cache MISS");
            }
            Err(e) => {
                PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                warn!(key, "page cache read failed: {}", e);
            }
        }

        let body = render().await?;

        if let Err(e) = self.backend.put(key, &body, self.ttl).await {
            warn!(key, "page cache write failed: {}", e);
        }

        Ok(body)
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn key_ignores_parameter_order() {
        assert_eq!(
            page_cache_key("index", "page=2&sort=new"),
            page_cache_key("index", "sort=new&page=2")
        );
    }

    #[test]
    fn key_distinguishes_pages_and_views() {
        assert_ne!(page_cache_key("index", "page=1"), page_cache_key("index", "page=2"));
        assert_ne!(page_cache_key("index", ""), page_cache_key("group", ""));
        assert!(page_cache_key("index", "").starts_with("page_cache:v1:index:"));
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let service = PageCacheService::new(
            Arc::new(MemoryPageCache::new()),
            Duration::from_secs(20),
        );
        let renders = AtomicUsize::new(0);

        for _ in 0..2 {
            let body = service
                .get_or_render("k", || async {
                    renders.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>("rendered".to_string())
                })
                .await
                .unwrap();
            assert_eq!(body, "rendered");
        }

        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn render_failure_is_not_cached() {
        let service = PageCacheService::new(
            Arc::new(MemoryPageCache::new()),
            Duration::from_secs(20),
        );

        let failed = service
            .get_or_render("k", || async { Err(AppError::Internal("boom".into())) })
            .await;
        assert!(failed.is_err());

        let body = service
            .get_or_render("k", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "fresh");
    }
}
