pub mod admin;
pub mod attachments;
pub mod auth;
pub mod content_types;
pub mod file_types;
