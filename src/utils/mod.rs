//! Utility functions shared across the engine.
//!
//! - [`base62`] - short code encoding for sequence-issued codes
//! - [`password`] - Argon2id hashing and verification for gated links
//! - [`url_guard`] - destination URL validation and SSRF guard

pub mod base62;
pub mod password;
pub mod url_guard;
