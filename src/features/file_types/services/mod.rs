mod file_type_service;

pub use file_type_service::FileTypeService;
