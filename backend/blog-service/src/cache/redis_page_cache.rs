use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use tracing::{debug, warn};

use super::{PageCache, PAGE_CACHE_PREFIX};
use crate::error::{AppError, Result};

/// Redis-backed page cache shared by every worker and replica.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: ConnectionManager,
}

impl RedisPageCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to create Redis connection: {}", e)))?;
        Ok(Self::new(manager))
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let value = conn.get::<_, Option<String>>(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, body: &str, ttl: Duration) -> Result<()> {
        let secs = ttl.as_secs();
        if secs == 0 {
            return Ok(());
        }
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, body, secs).await.map_err(|e| {
            warn!("Redis SETEX failed for {}: {}", key, e);
            AppError::from(e)
        })?;
        debug!(key, ttl_secs = secs, "page cache WRITE");
        Ok(())
    }

    /// Uses SCAN instead of KEYS to avoid blocking Redis
    async fn clear(&self) -> Result<()> {
        let pattern = format!("{}*", PAGE_CACHE_PREFIX);
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, ()>(&mut conn)
                    .await?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!("Cleared {} cached pages", total_deleted);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Cache(format!("unexpected PING response: {}", pong)))
        }
    }
}
