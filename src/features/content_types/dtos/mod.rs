mod content_type_dto;

pub use content_type_dto::{ContentTypeResponseDto, CreateContentTypeDto};
