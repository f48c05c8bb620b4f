//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CachedLink, LinkCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Redis cache for link projections and fast click counters.
///
/// Uses `ConnectionManager` for connection reuse and reconnects. Projection
/// operations are fail-open: errors are logged and reported as misses or
/// silent successes so a cache outage degrades to repository lookups.
/// Counter operations propagate errors, because the service needs to know
/// when the fast counter is unavailable to fall back to the durable path.
pub struct RedisLinkCache {
    client: ConnectionManager,
    link_prefix: &'static str,
    clicks_prefix: &'static str,
}

impl RedisLinkCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            link_prefix: "link:",
            clicks_prefix: "clicks:",
        })
    }

    fn link_key(&self, code: &str) -> String {
        format!("{}{}", self.link_prefix, code)
    }

    fn clicks_key(&self, code: &str) -> String {
        format!("{}{}", self.clicks_prefix, code)
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get(&self, code: &str) -> CacheResult<Option<CachedLink>> {
        let key = self.link_key(code);
        let mut conn = self.client.clone();

        let raw = match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache MISS: {}", code);
                return Ok(None);
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", code, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<CachedLink>(&raw) {
            Ok(cached) => {
                debug!("Cache HIT: {}", code);
                Ok(Some(cached))
            }
            Err(e) => {
                // Corrupt entry: drop it and treat as a miss so the
                // repository stays the deciding tier.
                warn!("Corrupt cache entry for {}: {}", code, e);
                let _ = conn.del::<_, i32>(&key).await;
                Ok(None)
            }
        }
    }

    async fn set(&self, code: &str, link: &CachedLink, ttl: Duration) -> CacheResult<()> {
        let key = self.link_key(code);
        let mut conn = self.client.clone();

        let payload = serde_json::to_string(link)
            .map_err(|e| CacheError::OperationError(format!("serialize: {}", e)))?;

        match conn
            .set_ex::<_, _, ()>(&key, payload, ttl.as_secs().max(1))
            .await
        {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", code, ttl.as_secs());
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", code, e);
                Ok(())
            }
        }
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        let key = self.link_key(code);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", code);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", code, e);
                Ok(())
            }
        }
    }

    async fn increment_click(&self, code: &str) -> CacheResult<i64> {
        let key = self.clicks_key(code);
        let mut conn = self.client.clone();

        conn.incr::<_, _, i64>(&key, 1)
            .await
            .map_err(|e| CacheError::OperationError(format!("INCR {}: {}", key, e)))
    }

    async fn get_click_count(&self, code: &str) -> CacheResult<Option<i64>> {
        let key = self.clicks_key(code);
        let mut conn = self.client.clone();

        conn.get::<_, Option<i64>>(&key)
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {}: {}", key, e)))
    }

    async fn set_click_count(&self, code: &str, count: i64, ttl: Duration) -> CacheResult<()> {
        let key = self.clicks_key(code);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, count, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::OperationError(format!("SET {}: {}", key, e)))
    }

    async fn delete_click_count(&self, code: &str) -> CacheResult<()> {
        let key = self.clicks_key(code);
        let mut conn = self.client.clone();

        conn.del::<_, i32>(&key)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::OperationError(format!("DEL {}: {}", key, e)))
    }

    async fn expire_click_count(&self, code: &str, ttl: Duration) -> CacheResult<()> {
        let key = self.clicks_key(code);
        let mut conn = self.client.clone();

        conn.expire::<_, ()>(&key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(|e| CacheError::OperationError(format!("EXPIRE {}: {}", key, e)))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
