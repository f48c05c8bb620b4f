//! In-process cache implementation.

use super::service::{CacheResult, CachedLink, LinkCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// TTL-aware in-memory cache backed by hash maps.
///
/// Drop-in stand-in for Redis in tests and single-process development runs.
/// Entries are evicted lazily on read; there is no background sweeper.
#[derive(Default)]
pub struct MemoryLinkCache {
    links: Mutex<HashMap<String, (CachedLink, Instant)>>,
    counters: Mutex<HashMap<String, (i64, Option<Instant>)>>,
}

impl MemoryLinkCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn expired(deadline: Instant) -> bool {
    Instant::now() >= deadline
}

#[async_trait]
impl LinkCache for MemoryLinkCache {
    async fn get(&self, code: &str) -> CacheResult<Option<CachedLink>> {
        let mut links = self.links.lock().await;

        match links.get(code) {
            Some((_, deadline)) if expired(*deadline) => {
                links.remove(code);
                Ok(None)
            }
            Some((cached, _)) => Ok(Some(cached.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, code: &str, link: &CachedLink, ttl: Duration) -> CacheResult<()> {
        let deadline = Instant::now() + ttl;
        self.links
            .lock()
            .await
            .insert(code.to_string(), (link.clone(), deadline));
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        self.links.lock().await.remove(code);
        Ok(())
    }

    async fn increment_click(&self, code: &str) -> CacheResult<i64> {
        let mut counters = self.counters.lock().await;

        let entry = counters.entry(code.to_string()).or_insert((0, None));
        if entry.1.is_some_and(expired) {
            *entry = (0, None);
        }
        entry.0 += 1;
        Ok(entry.0)
    }

    async fn get_click_count(&self, code: &str) -> CacheResult<Option<i64>> {
        let mut counters = self.counters.lock().await;

        match counters.get(code) {
            Some((_, Some(deadline))) if expired(*deadline) => {
                counters.remove(code);
                Ok(None)
            }
            Some((count, _)) => Ok(Some(*count)),
            None => Ok(None),
        }
    }

    async fn set_click_count(&self, code: &str, count: i64, ttl: Duration) -> CacheResult<()> {
        let deadline = Instant::now() + ttl;
        self.counters
            .lock()
            .await
            .insert(code.to_string(), (count, Some(deadline)));
        Ok(())
    }

    async fn delete_click_count(&self, code: &str) -> CacheResult<()> {
        self.counters.lock().await.remove(code);
        Ok(())
    }

    async fn expire_click_count(&self, code: &str, ttl: Duration) -> CacheResult<()> {
        let mut counters = self.counters.lock().await;
        if let Some(entry) = counters.get_mut(code) {
            entry.1 = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CachedLink {
        CachedLink {
            long_url: "https://example.com".to_string(),
            has_password: false,
            expires_at: None,
            max_clicks: None,
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryLinkCache::new();

        cache
            .set("abc", &sample(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("abc").await.unwrap(), Some(sample()));

        cache.delete("abc").await.unwrap();
        assert_eq!(cache.get("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryLinkCache::new();

        cache
            .set("abc", &sample(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counter_increments() {
        let cache = MemoryLinkCache::new();

        assert_eq!(cache.increment_click("abc").await.unwrap(), 1);
        assert_eq!(cache.increment_click("abc").await.unwrap(), 2);
        assert_eq!(cache.get_click_count("abc").await.unwrap(), Some(2));
        assert_eq!(cache.get_click_count("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counter_delete_resets_count() {
        let cache = MemoryLinkCache::new();

        cache.increment_click("abc").await.unwrap();
        cache.increment_click("abc").await.unwrap();

        cache.delete_click_count("abc").await.unwrap();
        assert_eq!(cache.get_click_count("abc").await.unwrap(), None);
        assert_eq!(cache.increment_click("abc").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_seed_and_expire() {
        let cache = MemoryLinkCache::new();

        cache
            .set_click_count("abc", 40, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.increment_click("abc").await.unwrap(), 41);

        cache
            .expire_click_count("abc", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get_click_count("abc").await.unwrap(), None);
    }
}
