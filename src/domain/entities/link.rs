//! Link entity: the sole durable record of the engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A short link row as stored durably.
///
/// `code` is the primary identifier. When a caller supplied an alias at
/// creation time, the alias *is* the code; `alias` only records that the
/// code was caller-chosen rather than sequence-issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub code: String,
    pub long_url: String,
    pub alias: Option<String>,
    /// Argon2id PHC string. Never serialized outward, never cached.
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i32>,
    /// Authoritative click counter. Lags the fast cache counter by up to the
    /// sync interval; monotonically non-decreasing.
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
}

impl Link {
    /// Returns true if the link has a password gate.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Derived expiry predicate: past `expires_at`, or the click ceiling has
    /// been reached. Never stored, no storage access.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry predicate against an explicit clock, for deterministic checks.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.expires_at.is_some_and(|e| now > e) {
            return true;
        }
        self.max_clicks
            .is_some_and(|max| self.click_count >= max as i64)
    }
}

/// Input data for inserting a new link.
///
/// `click_count` and `created_at` are owned by the repository: the counter
/// starts at zero and the timestamp is set once at insert.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub alias: Option<String>,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i32>,
    pub owner_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_link() -> Link {
        Link {
            code: "abc123".to_string(),
            long_url: "https://example.com".to_string(),
            alias: None,
            password_hash: None,
            expires_at: None,
            max_clicks: None,
            click_count: 0,
            created_at: Utc::now(),
            owner_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_not_expired_when_neither_limit_set() {
        assert!(!base_link().is_expired());
    }

    #[test]
    fn test_expired_by_timestamp() {
        let link = Link {
            expires_at: Some(Utc::now() - Duration::seconds(1)),
            ..base_link()
        };
        assert!(link.is_expired());
    }

    #[test]
    fn test_future_expiry_not_expired() {
        let link = Link {
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..base_link()
        };
        assert!(!link.is_expired());
    }

    #[test]
    fn test_expired_by_click_ceiling() {
        let link = Link {
            max_clicks: Some(10),
            click_count: 10,
            ..base_link()
        };
        assert!(link.is_expired());

        let under = Link {
            max_clicks: Some(10),
            click_count: 9,
            ..base_link()
        };
        assert!(!under.is_expired());
    }

    #[test]
    fn test_click_count_without_ceiling_never_expires() {
        let link = Link {
            click_count: 1_000_000,
            ..base_link()
        };
        assert!(!link.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let link = Link {
            expires_at: Some(now),
            ..base_link()
        };
        // `now > expires_at`, not `>=`.
        assert!(!link.is_expired_at(now));
        assert!(link.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_has_password() {
        assert!(!base_link().has_password());

        let gated = Link {
            password_hash: Some("$argon2id$...".to_string()),
            ..base_link()
        };
        assert!(gated.has_password());
    }
}
