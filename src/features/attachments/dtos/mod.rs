mod attachment_dto;
mod flat_dto;
mod link_dto;
mod owner_dto;

pub use attachment_dto::{
    AttachmentResponseDto, CreateAttachmentDto, UpdateAttachmentDto, UploadFileDto, UploaderDto,
};
pub use flat_dto::{AttachmentFlatDto, FlatQueryParams};
pub use link_dto::{AttachmentLinkResponseDto, CreateLinkDto};
pub use owner_dto::{
    AssociateAttachmentDto, LatestAttachmentDto, OwnerAttachmentDto, OwnerQueryParams,
};
