//! Application error taxonomy.
//!
//! Every fallible service and repository operation returns [`AppError`].
//! Cache failures never surface here: they are absorbed and logged at the
//! call site (see [`crate::infrastructure::cache::CacheError`]).

use serde_json::{Value, json};

/// Errors surfaced by the link engine.
///
/// The variants map 1:1 onto the outcomes a caller must distinguish:
///
/// - [`AppError::Validation`] - malformed or disallowed input, no retry
/// - [`AppError::Conflict`] - code/alias already in use, retry with another
/// - [`AppError::NotFound`] - no row for the given code
/// - [`AppError::AccessDenied`] - row exists but the caller is not the owner
/// - [`AppError::Precondition`] - missing caller identity on an owner-scoped call
/// - [`AppError::Internal`] - storage failure, retryable by the caller
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    AccessDenied { message: String, details: Value },

    #[error("{message}")]
    Precondition { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn access_denied(message: impl Into<String>, details: Value) -> Self {
        Self::AccessDenied {
            message: message.into(),
            details,
        }
    }

    pub fn precondition(message: impl Into<String>, details: Value) -> Self {
        Self::Precondition {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::AccessDenied { .. } => "access_denied",
            Self::Precondition { .. } => "precondition_failed",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Maps a SQLx error onto the application taxonomy.
///
/// Unique-constraint violations become [`AppError::Conflict`] so the create
/// transaction can report "already exists" to racing callers; everything else
/// is an internal (retryable) failure. Details never include SQL text.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
    }

    AppError::internal("Database error", json!({}))
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AppError::bad_request("m", json!({})),
            AppError::not_found("m", json!({})),
            AppError::conflict("m", json!({})),
            AppError::access_denied("m", json!({})),
            AppError::precondition("m", json!({})),
            AppError::internal("m", json!({})),
        ];

        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_message() {
        let err = AppError::conflict("code already exists", json!({ "code": "abc" }));
        assert_eq!(err.to_string(), "code already exists");
    }

    #[test]
    fn test_access_denied_distinguishable_from_not_found() {
        let denied = AppError::access_denied("not the owner", json!({}));
        let missing = AppError::not_found("no such link", json!({}));

        assert!(matches!(denied, AppError::AccessDenied { .. }));
        assert!(matches!(missing, AppError::NotFound { .. }));
        assert_ne!(denied.code(), missing.code());
    }

    #[test]
    fn test_map_sqlx_error_non_database() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
