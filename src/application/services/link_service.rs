//! Link lifecycle orchestration.
//!
//! [`LinkService`] is the only component aware of the consistency rules
//! between the durable repository and the derived cache. All external
//! operations enter here; the repository stays authoritative and every cache
//! interaction is best-effort.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::access::{AccessGuard, ExistenceDisclosure, require_identity};
use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CachedLink, LinkCache};
use crate::utils::base62;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::url_guard::validate_long_url;

/// Request payload for creating a link.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    pub long_url: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_clicks: Option<i32>,
}

/// Response payload after a successful create.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLinkResponse {
    pub code: String,
    pub short_url: String,
    pub metadata: LinkMetadata,
}

/// Non-sensitive link metadata echoed back to the creator.
#[derive(Debug, Clone, Serialize)]
pub struct LinkMetadata {
    pub has_password: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i32>,
}

/// Partial update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub long_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_clicks: Option<i32>,
}

/// Validation and caching policy owned by the service instance.
///
/// Constructed once at startup; nothing here is mutated at runtime or read
/// from globals.
#[derive(Debug, Clone)]
pub struct LinkServicePolicy {
    /// Public base URL the short link is rendered under.
    pub base_url: String,
    /// Lowercased aliases that can never be claimed.
    pub reserved_aliases: HashSet<String>,
    /// Ceiling for a populated projection's TTL.
    pub max_cache_ttl: Duration,
    /// TTL for the negative ("no such code") marker.
    pub negative_cache_ttl: Duration,
    /// Every Nth fast increment is written back to the durable counter.
    pub click_sync_interval: i64,
    /// What a non-owner learns about a row that exists.
    pub disclosure: ExistenceDisclosure,
    alias_pattern: Regex,
}

impl LinkServicePolicy {
    /// Policy with the default rules: 24h projection TTL, 5min negative TTL,
    /// sync every 10th click, reserved aliases `api`, `admin`, `r`, `v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            reserved_aliases: ["api", "admin", "r", "v1"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            max_cache_ttl: Duration::from_secs(24 * 60 * 60),
            negative_cache_ttl: Duration::from_secs(5 * 60),
            click_sync_interval: 10,
            disclosure: ExistenceDisclosure::default(),
            alias_pattern: Regex::new(r"^[A-Za-z0-9_-]{1,50}$").expect("alias pattern is valid"),
        }
    }

    /// Builds the policy from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut policy = Self::new(config.base_url.clone());
        policy.reserved_aliases = config
            .reserved_aliases
            .iter()
            .map(|a| a.to_ascii_lowercase())
            .collect();
        policy.max_cache_ttl = Duration::from_secs(config.cache_ttl_max_seconds);
        policy.negative_cache_ttl = Duration::from_secs(config.negative_cache_ttl_seconds);
        policy.click_sync_interval = config.click_sync_interval;
        policy.disclosure = config.ownership_disclosure;
        policy
    }

    /// TTL for a populated projection: time remaining until `expires_at`,
    /// capped at the configured maximum.
    fn projection_ttl(&self, expires_at: Option<DateTime<Utc>>) -> Duration {
        let mut ttl = self.max_cache_ttl;
        if let Some(expires_at) = expires_at {
            if let Ok(remaining) = (expires_at - Utc::now()).to_std() {
                if !remaining.is_zero() && remaining < ttl {
                    ttl = remaining;
                }
            }
        }
        ttl
    }
}

/// Orchestrates link lifecycle operations across the repository and cache.
///
/// The repository is a generic parameter (its transaction type is an
/// associated type, so the trait has no object-safe form); the cache is held
/// as a trait object so the backend can be chosen at startup.
pub struct LinkService<R: LinkRepository> {
    repository: Arc<R>,
    cache: Arc<dyn LinkCache>,
    policy: LinkServicePolicy,
    guard: AccessGuard,
}

impl<R: LinkRepository> LinkService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<dyn LinkCache>, policy: LinkServicePolicy) -> Self {
        let guard = AccessGuard::new(policy.disclosure);
        Self {
            repository,
            cache,
            policy,
            guard,
        }
    }

    /// Creates a link for `caller`.
    ///
    /// Validation order: destination URL (format, scheme, SSRF guard, raw
    /// payload), alias, caller identity, password. The code is the alias when
    /// one was requested, otherwise sequence-issued. The existence check and
    /// insert run in one transaction, so two callers racing for the same
    /// alias are linearized by the store: exactly one commits, the other
    /// receives [`AppError::Conflict`].
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] - bad URL, blocked host, invalid or reserved alias
    /// - [`AppError::Precondition`] - no caller identity
    /// - [`AppError::Conflict`] - code already taken
    pub async fn create_link(
        &self,
        req: CreateLinkRequest,
        caller: Option<Uuid>,
    ) -> Result<CreateLinkResponse, AppError> {
        validate_long_url(&req.long_url)?;
        let alias = self.normalize_alias(req.alias.as_deref())?;
        let owner_id = require_identity(caller)?;

        let password_hash = match req.password.as_deref() {
            Some(password) if !password.is_empty() => Some(hash_password(password)?),
            _ => None,
        };

        let code = match &alias {
            Some(alias) => alias.clone(),
            None => self.generate_code().await?,
        };

        let new_link = NewLink {
            code: code.clone(),
            long_url: req.long_url,
            alias,
            password_hash,
            expires_at: req.expires_at,
            max_clicks: req.max_clicks,
            owner_id,
        };

        self.create_exclusive(&new_link).await?;

        // Best-effort: a failed population only costs the first reader a
        // repository round trip.
        let projection = CachedLink {
            long_url: new_link.long_url.clone(),
            has_password: new_link.password_hash.is_some(),
            expires_at: new_link.expires_at,
            max_clicks: new_link.max_clicks,
        };
        let ttl = self.policy.projection_ttl(new_link.expires_at);
        if let Err(e) = self.cache.set(&code, &projection, ttl).await {
            warn!("cache population failed for {}: {}", code, e);
        }

        Ok(CreateLinkResponse {
            short_url: self.short_url(&code),
            metadata: LinkMetadata {
                has_password: new_link.password_hash.is_some(),
                expires_at: new_link.expires_at,
                max_clicks: new_link.max_clicks,
            },
            code,
        })
    }

    /// Check-then-insert inside a single transaction.
    async fn create_exclusive(&self, new_link: &NewLink) -> Result<(), AppError> {
        let mut tx = self.repository.begin().await?;

        match self.repository.get_by_code_in_tx(&mut tx, &new_link.code).await {
            Ok(Some(_)) => {
                let _ = self.repository.rollback(tx).await;
                return Err(AppError::conflict(
                    "Code already exists",
                    json!({ "code": new_link.code }),
                ));
            }
            Ok(None) => {}
            Err(e) => {
                let _ = self.repository.rollback(tx).await;
                return Err(e);
            }
        }

        if let Err(e) = self.repository.create_in_tx(&mut tx, new_link).await {
            let _ = self.repository.rollback(tx).await;
            return Err(e);
        }

        self.repository.commit(tx).await
    }

    /// Resolves a link by code, cache-aside.
    ///
    /// Cache hits are served from the projection (with the password hash
    /// always absent and the click counter read from the fast counter). A
    /// projection whose `expires_at` has passed is evicted and the read falls
    /// through to the repository. Misses repopulate the cache at the policy
    /// TTL; absent codes are cached as a short-lived negative marker.
    pub async fn get_link(&self, code: &str) -> Result<Option<Link>, AppError> {
        match self.cache.get(code).await {
            Ok(Some(cached)) => {
                if cached.is_negative() {
                    return Ok(None);
                }
                if cached.expires_at.is_some_and(|e| Utc::now() > e) {
                    if let Err(e) = self.cache.delete(code).await {
                        warn!("eviction of expired entry {} failed: {}", code, e);
                    }
                    // Fall through to the repository.
                } else {
                    return Ok(Some(self.link_from_projection(code, cached).await));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("cache read failed for {}: {}", code, e),
        }

        let Some(link) = self.repository.get_by_code(code).await? else {
            let ttl = self.policy.negative_cache_ttl;
            if let Err(e) = self.cache.set(code, &CachedLink::negative(), ttl).await {
                warn!("negative caching failed for {}: {}", code, e);
            }
            return Ok(None);
        };

        let ttl = self.policy.projection_ttl(link.expires_at);
        if let Err(e) = self.cache.set(code, &CachedLink::from_link(&link), ttl).await {
            warn!("cache population failed for {}: {}", code, e);
        }

        // Seed the fast counter from the durable floor so click-limit expiry
        // keeps working through the cache path. Never overwrite a live
        // counter: it is already ahead of the durable value.
        if link.max_clicks.is_some() {
            match self.cache.get_click_count(code).await {
                Ok(None) => {
                    if let Err(e) = self.cache.set_click_count(code, link.click_count, ttl).await {
                        warn!("click counter seeding failed for {}: {}", code, e);
                    }
                }
                Ok(Some(_)) => {}
                Err(e) => warn!("click counter read failed for {}: {}", code, e),
            }
        }

        Ok(Some(link))
    }

    /// Verifies the password gate on a link.
    ///
    /// Always bypasses the cache: the hash only exists on the durable row.
    /// A link without a password gate, a mismatch, and a malformed stored
    /// hash all verify `false`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when the code has no row.
    pub async fn verify_password(&self, code: &str, password: &str) -> Result<bool, AppError> {
        let Some(link) = self.repository.get_by_code(code).await? else {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        };

        let Some(hash) = link.password_hash.as_deref() else {
            return Ok(false);
        };

        Ok(verify_password(password, hash))
    }

    /// Records a click.
    ///
    /// The fast cache counter absorbs every redirect; the durable column is
    /// written only when the fast value is an exact multiple of the sync
    /// interval, so it under-reports by at most `interval - 1`. All failures
    /// on this path are logged and swallowed: a broken counter must never
    /// fail the caller's redirect.
    pub async fn increment_click_count(&self, code: &str) {
        match self.cache.increment_click(code).await {
            Ok(count) => {
                // An interval below 1 syncs on every click.
                if count % self.policy.click_sync_interval.max(1) == 0 {
                    if let Err(e) = self.repository.set_click_count(code, count).await {
                        warn!("durable click sync failed for {}: {}", code, e);
                    }
                }
            }
            Err(cache_err) => {
                // No fast counter available: count directly on the durable
                // row so clicks are not silently dropped.
                warn!("fast click counter unavailable for {}: {}", code, cache_err);
                if let Err(e) = self.repository.increment_click_count(code).await {
                    warn!("durable click increment failed for {}: {}", code, e);
                }
            }
        }
    }

    /// Applies a partial update to a link owned by `caller`.
    ///
    /// Fields absent from the request are untouched; a new destination is
    /// re-validated and a new password re-hashed. The cache entry is
    /// invalidated strictly after the durable write, otherwise a concurrent
    /// reader could repopulate the cache from the pre-mutation row.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] - no caller identity
    /// - [`AppError::NotFound`] - no row for the code (checked before ownership)
    /// - [`AppError::AccessDenied`] - caller is not the owner
    /// - [`AppError::Validation`] - replacement URL fails validation
    pub async fn update_link(
        &self,
        code: &str,
        req: UpdateLinkRequest,
        caller: Option<Uuid>,
    ) -> Result<(), AppError> {
        let caller = require_identity(caller)?;

        let Some(mut link) = self.repository.get_by_code(code).await? else {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        };

        self.guard.authorize(&link, caller)?;

        if let Some(long_url) = req.long_url {
            validate_long_url(&long_url)?;
            link.long_url = long_url;
        }
        if let Some(password) = req.password.as_deref() {
            link.password_hash = Some(hash_password(password)?);
        }
        if let Some(expires_at) = req.expires_at {
            link.expires_at = Some(expires_at);
        }
        if let Some(max_clicks) = req.max_clicks {
            link.max_clicks = Some(max_clicks);
        }

        self.repository.update(&link).await?;

        if let Err(e) = self.cache.delete(code).await {
            warn!("cache invalidation failed for {}: {}", code, e);
        }

        Ok(())
    }

    /// Deletes a link owned by `caller`, invalidating its cache entry and
    /// fast click counter.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`LinkService::update_link`], minus validation.
    pub async fn delete_link(&self, code: &str, caller: Option<Uuid>) -> Result<(), AppError> {
        let caller = require_identity(caller)?;

        let Some(link) = self.repository.get_by_code(code).await? else {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        };

        self.guard.authorize(&link, caller)?;

        if let Err(e) = self.cache.delete(code).await {
            warn!("cache invalidation failed for {}: {}", code, e);
        }

        // The fast counter dies with the entity: a later link reusing this
        // code must start counting from zero.
        if let Err(e) = self.cache.delete_click_count(code).await {
            warn!("click counter invalidation failed for {}: {}", code, e);
        }

        self.repository.delete(code).await
    }

    /// Renders the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/r/{}", self.policy.base_url.trim_end_matches('/'), code)
    }

    /// Draws the next sequence value and encodes it as a base-62 code.
    async fn generate_code(&self) -> Result<String, AppError> {
        let id = self.repository.next_code_id().await?;
        let id = u64::try_from(id).map_err(|_| {
            AppError::internal("Code sequence returned a negative value", json!({ "id": id }))
        })?;
        Ok(base62::encode(id))
    }

    /// Validates a requested alias. An empty string means "no alias".
    fn normalize_alias(&self, alias: Option<&str>) -> Result<Option<String>, AppError> {
        let Some(alias) = alias else {
            return Ok(None);
        };
        if alias.is_empty() {
            return Ok(None);
        }

        if !self.policy.alias_pattern.is_match(alias) {
            return Err(AppError::bad_request(
                "Alias must be 1-50 characters of letters, digits, '_' or '-'",
                json!({ "alias": alias }),
            ));
        }

        if self
            .policy
            .reserved_aliases
            .contains(&alias.to_ascii_lowercase())
        {
            return Err(AppError::bad_request(
                "This alias is reserved",
                json!({ "alias": alias }),
            ));
        }

        Ok(Some(alias.to_string()))
    }

    /// Rebuilds a serving view of the link from the cached projection.
    ///
    /// The projection has no password hash, owner, or creation timestamp;
    /// callers needing those must read through the repository. The click
    /// counter comes from the fast counter, the chosen source of truth for
    /// click-limit expiry on the cache path.
    async fn link_from_projection(&self, code: &str, cached: CachedLink) -> Link {
        let click_count = match self.cache.get_click_count(code).await {
            Ok(Some(count)) => count,
            Ok(None) => 0,
            Err(e) => {
                warn!("click counter read failed for {}: {}", code, e);
                0
            }
        };

        Link {
            code: code.to_string(),
            long_url: cached.long_url,
            alias: None,
            password_hash: None,
            expires_at: cached.expires_at,
            max_clicks: cached.max_clicks,
            click_count,
            created_at: DateTime::UNIX_EPOCH,
            owner_id: None,
        }
    }
}
