//! Core business entities.
//!
//! - [`Link`] - a short link row as stored durably
//! - [`NewLink`] - input data for creating a row
//!
//! The cached projection of a link lives with the cache contract in
//! [`crate::infrastructure::cache`]: it is a derived artifact, not an entity.

pub mod link;

pub use link::{Link, NewLink};
