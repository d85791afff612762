use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use super::PageCache;
use crate::error::Result;

struct CachedEntry {
    body: String,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Minimum spacing between two sweeps of expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// In-process page cache used when no Redis URL is configured.
///
/// Expired entries are dropped when read, and swept from the whole map on
/// `put` once the earliest recorded expiry has passed.
#[derive(Default)]
pub struct MemoryPageCache {
    store: DashMap<String, CachedEntry>,
    next_sweep: Mutex<Option<Instant>>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep_expired(&self, now: Instant) {
        let mut next_sweep = self.next_sweep.lock().unwrap_or_else(PoisonError::into_inner);
        match *next_sweep {
            Some(at) if now >= at => {}
            _ => return,
        }

        let before = self.store.len();
        self.store.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            debug!(removed, "swept expired page cache entries");
        }

        *next_sweep = self
            .store
            .iter()
            .map(|entry| entry.expires_at)
            .min()
            .map(|earliest| earliest.max(now + SWEEP_INTERVAL));
    }

    fn schedule_sweep(&self, expires_at: Instant) {
        let mut next_sweep = self.next_sweep.lock().unwrap_or_else(PoisonError::into_inner);
        if next_sweep.map_or(true, |at| expires_at < at) {
            *next_sweep = Some(expires_at);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.body.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired: evict after the read guard is released.
        self.store.remove(key);
        debug!(key, "page cache entry expired");
        Ok(None)
    }

    async fn put(&self, key: &str, body: &str, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let now = Instant::now();
        self.sweep_expired(now);

        let expires_at = now + ttl;
        self.store.insert(
            key.to_string(),
            CachedEntry {
                body: body.to_string(),
                expires_at,
            },
        );
        self.schedule_sweep(expires_at);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.store.clear();
        *self.next_sweep.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = MemoryPageCache::new();
        cache.put("k", "body", Duration::from_millis(20)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("body"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let cache = MemoryPageCache::new();
        cache.put("k", "body", Duration::ZERO).await.unwrap();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn put_sweeps_entries_nobody_reads_again() {
        let cache = MemoryPageCache::new();
        for i in 0..200 {
            cache
                .put(&format!("page_cache:v1:index:{}", i), "body", Duration::from_millis(30))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 200);

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.put("fresh", "body", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn live_entries_survive_a_sweep() {
        let cache = MemoryPageCache::new();
        cache.put("short", "1", Duration::from_millis(10)).await.unwrap();
        cache.put("long", "2", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.put("other", "3", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = MemoryPageCache::new();
        cache.put("a", "1", Duration::from_secs(60)).await.unwrap();
        cache.put("b", "2", Duration::from_secs(60)).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.is_empty());
    }
}
