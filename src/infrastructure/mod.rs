//! Infrastructure layer: durable storage and cache backends.

pub mod cache;
pub mod persistence;
