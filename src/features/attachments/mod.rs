pub mod dtos;
pub mod extensions;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::{routes, with_permission, AttachmentsState};
pub use services::{AttachmentService, LinkService};
