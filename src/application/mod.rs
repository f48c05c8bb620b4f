//! Application layer: use-case orchestration over domain contracts.

pub mod services;

pub use services::{
    CreateLinkRequest, CreateLinkResponse, LinkMetadata, LinkService, LinkServicePolicy,
    UpdateLinkRequest,
};
