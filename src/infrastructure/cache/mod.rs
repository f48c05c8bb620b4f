//! Caching tier: derived link projections and fast click counters.
//!
//! Provides the [`LinkCache`] trait with three implementations:
//! - [`RedisLinkCache`] - production Redis backend
//! - [`MemoryLinkCache`] - in-process map for tests and development
//! - [`NullLinkCache`] - no-op implementation for disabled caching

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryLinkCache;
pub use null_cache::NullLinkCache;
pub use redis_cache::RedisLinkCache;
pub use service::{CacheError, CacheResult, CachedLink, LinkCache};

#[cfg(test)]
pub use service::MockLinkCache;
