pub mod link_service;

pub use link_service::{
    CreateLinkRequest, CreateLinkResponse, LinkMetadata, LinkService, LinkServicePolicy,
    UpdateLinkRequest,
};
