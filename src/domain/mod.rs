//! Domain layer: entities, ownership rules, and storage contracts.
//!
//! The domain layer has no dependency on infrastructure. Repository traits
//! defined here are implemented in [`crate::infrastructure`]; business
//! orchestration lives in [`crate::application::services`].

pub mod access;
pub mod entities;
pub mod repositories;
