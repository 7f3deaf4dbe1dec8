pub mod dtos;
pub mod models;
pub mod services;

pub use models::{ContentType, Owner};
pub use services::ContentTypeService;
