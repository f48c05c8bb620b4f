//! Cache contract, cached projection, and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::entities::Link;

/// Errors that can occur during cache operations.
///
/// These never cross into [`crate::error::AppError`]: the cache is a derived
/// tier, and the service absorbs and logs every failure it produces.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Ephemeral projection of a link, keyed by code.
///
/// A strict subset of the durable row: the password hash is represented only
/// as the `has_password` flag and never stored here. The projection is never
/// authoritative; correctness-sensitive decisions (ownership, password
/// verification) always go to the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLink {
    pub long_url: String,
    pub has_password: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i32>,
}

impl CachedLink {
    /// Builds the projection from a durable row.
    pub fn from_link(link: &Link) -> Self {
        Self {
            long_url: link.long_url.clone(),
            has_password: link.has_password(),
            expires_at: link.expires_at,
            max_clicks: link.max_clicks,
        }
    }

    /// Marker for a code known not to exist, cached briefly to dampen
    /// repeated lookups of missing codes.
    pub fn negative() -> Self {
        Self {
            long_url: String::new(),
            has_password: false,
            expires_at: None,
            max_clicks: None,
        }
    }

    /// A destination can never be empty, so an empty `long_url` uniquely
    /// identifies the negative marker.
    pub fn is_negative(&self) -> bool {
        self.long_url.is_empty()
    }
}

/// Best-effort cache over link projections plus a fast per-code click counter.
///
/// `get` returns `Ok(None)` on miss; a miss is never an error. The fast
/// counter is independent of the durable `click_count` column and is volatile:
/// it may be lost on cache restart, which the click accounting policy accepts.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisLinkCache`] - production Redis backend
/// - [`crate::infrastructure::cache::MemoryLinkCache`] - in-process map for tests
/// - [`crate::infrastructure::cache::NullLinkCache`] - caching disabled
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Fetches the cached projection for a code.
    async fn get(&self, code: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a projection with an explicit TTL.
    async fn set(&self, code: &str, link: &CachedLink, ttl: Duration) -> CacheResult<()>;

    /// Drops the cached projection for a code.
    async fn delete(&self, code: &str) -> CacheResult<()>;

    /// Atomically increments the fast click counter, returning the new value.
    async fn increment_click(&self, code: &str) -> CacheResult<i64>;

    /// Reads the fast click counter; `Ok(None)` when no counter exists.
    async fn get_click_count(&self, code: &str) -> CacheResult<Option<i64>>;

    /// Seeds or overwrites the fast click counter.
    async fn set_click_count(&self, code: &str, count: i64, ttl: Duration) -> CacheResult<()>;

    /// Re-arms the TTL on the fast click counter.
    async fn expire_click_count(&self, code: &str, ttl: Duration) -> CacheResult<()>;

    /// Drops the fast click counter for a code.
    ///
    /// Part of entity teardown: a later link reusing the code must start
    /// counting from zero.
    async fn delete_click_count(&self, code: &str) -> CacheResult<()>;

    /// Reports whether the cache backend is reachable.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_projection_excludes_password_hash() {
        let link = Link {
            code: "abc".to_string(),
            long_url: "https://example.com".to_string(),
            alias: None,
            password_hash: Some("$argon2id$secret".to_string()),
            expires_at: None,
            max_clicks: Some(5),
            click_count: 2,
            created_at: Utc::now(),
            owner_id: Some(Uuid::new_v4()),
        };

        let cached = CachedLink::from_link(&link);

        assert!(cached.has_password);
        assert_eq!(cached.max_clicks, Some(5));
        let json = serde_json::to_string(&cached).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_negative_marker() {
        assert!(CachedLink::negative().is_negative());

        let populated = CachedLink {
            long_url: "https://example.com".to_string(),
            has_password: false,
            expires_at: None,
            max_clicks: None,
        };
        assert!(!populated.is_negative());
    }

    #[test]
    fn test_projection_round_trips_through_json() {
        let cached = CachedLink {
            long_url: "https://example.com/x".to_string(),
            has_password: true,
            expires_at: Some(Utc::now()),
            max_clicks: Some(3),
        };

        let json = serde_json::to_string(&cached).unwrap();
        let back: CachedLink = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cached);
    }
}
