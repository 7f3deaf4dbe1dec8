mod attachment_service;
mod base64_file;
mod file_path;
mod flat_service;
mod link_service;
mod safe_file;

pub use attachment_service::{AttachmentService, UploadedFile};
pub use flat_service::FlatStore;
pub use link_service::LinkService;
