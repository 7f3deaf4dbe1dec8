mod file_type_dto;

pub use file_type_dto::{
    CleanupReportDto, CreateFileTypeDto, FileTypeQueryParams, FileTypeResponseDto, MoveDirection,
    UpdateFileTypeDto,
};
