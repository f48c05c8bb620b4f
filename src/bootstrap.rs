//! Startup wiring: configuration, database pool, cache backend, engine.
//!
//! The cache degrades instead of failing: when Redis is configured but
//! unreachable at startup, the engine runs on [`NullLinkCache`] and every
//! read goes to the repository.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::application::{LinkService, LinkServicePolicy};
use crate::config::{self, Config};
use crate::infrastructure::cache::{LinkCache, NullLinkCache, RedisLinkCache};
use crate::infrastructure::persistence::{PgLinkRepository, run_migrations};
use crate::logging;

/// Loads `.env`, reads and validates configuration, and installs the tracing
/// subscriber.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
pub fn init() -> Result<Config> {
    dotenvy::dotenv().ok();
    let config = config::load_from_env()?;
    logging::init(&config);
    config.print_summary();
    Ok(config)
}

/// Connects the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn build_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Selects the cache backend for this run.
///
/// Redis when configured and reachable, otherwise the null cache.
pub async fn build_cache(config: &Config) -> Arc<dyn LinkCache> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullLinkCache)");
        return Arc::new(NullLinkCache::new());
    };

    match RedisLinkCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullLinkCache.", e);
            Arc::new(NullLinkCache::new())
        }
    }
}

/// Assembles the production engine: pool, migrations, cache, service.
///
/// # Errors
///
/// Returns an error if the database is unreachable or migrations fail.
pub async fn build_engine(config: &Config) -> Result<LinkService<PgLinkRepository>> {
    let pool = build_pool(config).await?;

    run_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;

    let cache = build_cache(config).await;
    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool)));

    Ok(LinkService::new(
        repository,
        cache,
        LinkServicePolicy::from_config(config),
    ))
}
