//! Ownership checks for owner-scoped operations.
//!
//! A single capability rule: the caller identity must equal the row's
//! `owner_id` exactly. There is no anonymous grant; an absent caller identity
//! fails the precondition before any row is consulted, and an absent owner on
//! the row is always a denial.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::Link;
use crate::error::AppError;

/// What a non-owner learns about a row that exists.
///
/// The engine deliberately makes this an explicit configuration choice rather
/// than hard-coding either behavior:
///
/// - [`ExistenceDisclosure::Reveal`] - a non-owner receives
///   [`AppError::AccessDenied`], revealing that the code is taken
/// - [`ExistenceDisclosure::Hide`] - a non-owner receives
///   [`AppError::NotFound`], indistinguishable from a missing row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistenceDisclosure {
    #[default]
    Reveal,
    Hide,
}

impl FromStr for ExistenceDisclosure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reveal" => Ok(Self::Reveal),
            "hide" => Ok(Self::Hide),
            other => Err(format!(
                "invalid disclosure policy '{}', expected 'reveal' or 'hide'",
                other
            )),
        }
    }
}

/// Guard applying the ownership rule and the disclosure policy.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    disclosure: ExistenceDisclosure,
}

impl AccessGuard {
    pub fn new(disclosure: ExistenceDisclosure) -> Self {
        Self { disclosure }
    }

    /// Authorizes `caller` for an owner-scoped mutation of `link`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccessDenied`] (or [`AppError::NotFound`] under
    /// [`ExistenceDisclosure::Hide`]) when the caller is not the owner,
    /// including when the row carries no owner at all.
    pub fn authorize(&self, link: &Link, caller: Uuid) -> Result<(), AppError> {
        if link.owner_id == Some(caller) {
            return Ok(());
        }

        match self.disclosure {
            ExistenceDisclosure::Reveal => Err(AppError::access_denied(
                "Access denied: not the owner of this link",
                json!({ "code": link.code }),
            )),
            ExistenceDisclosure::Hide => Err(AppError::not_found(
                "Short link not found",
                json!({ "code": link.code }),
            )),
        }
    }
}

/// Resolves the caller identity for an owner-scoped call.
///
/// # Errors
///
/// Returns [`AppError::Precondition`] when no identity was supplied; the
/// operation cannot proceed anonymously.
pub fn require_identity(caller: Option<Uuid>) -> Result<Uuid, AppError> {
    caller.ok_or_else(|| AppError::precondition("Caller identity is required", json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn link_owned_by(owner: Option<Uuid>) -> Link {
        Link {
            code: "abc".to_string(),
            long_url: "https://example.com".to_string(),
            alias: None,
            password_hash: None,
            expires_at: None,
            max_clicks: None,
            click_count: 0,
            created_at: Utc::now(),
            owner_id: owner,
        }
    }

    #[test]
    fn test_owner_is_authorized() {
        let owner = Uuid::new_v4();
        let guard = AccessGuard::new(ExistenceDisclosure::Reveal);
        assert!(guard.authorize(&link_owned_by(Some(owner)), owner).is_ok());
    }

    #[test]
    fn test_non_owner_denied_under_reveal() {
        let guard = AccessGuard::new(ExistenceDisclosure::Reveal);
        let result = guard.authorize(&link_owned_by(Some(Uuid::new_v4())), Uuid::new_v4());
        assert!(matches!(result, Err(AppError::AccessDenied { .. })));
    }

    #[test]
    fn test_non_owner_hidden_under_hide() {
        let guard = AccessGuard::new(ExistenceDisclosure::Hide);
        let result = guard.authorize(&link_owned_by(Some(Uuid::new_v4())), Uuid::new_v4());
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_ownerless_row_always_denied() {
        let guard = AccessGuard::new(ExistenceDisclosure::Reveal);
        let result = guard.authorize(&link_owned_by(None), Uuid::new_v4());
        assert!(matches!(result, Err(AppError::AccessDenied { .. })));
    }

    #[test]
    fn test_require_identity() {
        let id = Uuid::new_v4();
        assert_eq!(require_identity(Some(id)).unwrap(), id);
        assert!(matches!(
            require_identity(None),
            Err(AppError::Precondition { .. })
        ));
    }

    #[test]
    fn test_disclosure_from_str() {
        assert_eq!(
            "reveal".parse::<ExistenceDisclosure>().unwrap(),
            ExistenceDisclosure::Reveal
        );
        assert_eq!(
            "HIDE".parse::<ExistenceDisclosure>().unwrap(),
            ExistenceDisclosure::Hide
        );
        assert!("never".parse::<ExistenceDisclosure>().is_err());
    }
}
