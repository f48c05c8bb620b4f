//! No-op cache implementation for disabled caching.

use super::service::{CacheError, CacheResult, CachedLink, LinkCache};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache implementation that stores nothing.
///
/// Used when Redis is unavailable or caching is explicitly disabled. Every
/// read is a miss, every projection write succeeds silently, and counter
/// operations report the counter as unavailable so the service falls back to
/// the durable `+1` path for click accounting.
pub struct NullLinkCache;

impl NullLinkCache {
    pub fn new() -> Self {
        debug!("Using NullLinkCache (caching disabled)");
        Self
    }
}

impl Default for NullLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for NullLinkCache {
    async fn get(&self, _code: &str) -> CacheResult<Option<CachedLink>> {
        Ok(None)
    }

    async fn set(&self, _code: &str, _link: &CachedLink, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn increment_click(&self, _code: &str) -> CacheResult<i64> {
        Err(CacheError::OperationError(
            "fast click counter disabled".to_string(),
        ))
    }

    async fn get_click_count(&self, _code: &str) -> CacheResult<Option<i64>> {
        Ok(None)
    }

    async fn set_click_count(&self, _code: &str, _count: i64, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete_click_count(&self, _code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn expire_click_count(&self, _code: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
