mod content_type_service;

pub(crate) use content_type_service::quote_identifier;
pub use content_type_service::ContentTypeService;
