//! # Link Engine
//!
//! Link lifecycle and cache-aside consistency engine for a URL shortener,
//! built with SQLx (PostgreSQL) and Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities, ownership rules, and repository traits
//! - **Application Layer** ([`application`]) - The [`application::LinkService`] orchestrator
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL repository and cache backends
//!
//! ## Consistency model
//!
//! The repository is the sole source of truth; the cache holds a derived
//! projection of each link, keyed by code. Reads are cache-aside with
//! negative caching for missing codes, writes invalidate after the durable
//! commit, and click accounting runs on a fast cache counter that is synced
//! to the durable row on a fixed interval. Every cache failure degrades to a
//! repository round trip instead of an error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use link_engine::bootstrap;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = bootstrap::init()?;
//!     let engine = bootstrap::build_engine(&config).await?;
//!
//!     let link = engine.get_link("abc123").await?;
//!     println!("{:?}", link);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables via [`config::Config`].
//! See the [`config`] module for available options.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod utils;

pub mod bootstrap;
pub mod config;
pub mod logging;

pub use error::AppError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        CreateLinkRequest, CreateLinkResponse, LinkService, LinkServicePolicy, UpdateLinkRequest,
    };
    pub use crate::domain::access::ExistenceDisclosure;
    pub use crate::domain::entities::{Link, NewLink};
    pub use crate::error::AppError;
}
