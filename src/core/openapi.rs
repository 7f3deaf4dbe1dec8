use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::attachments::{dtos as attachments_dtos, handlers as attachments_handlers};
use crate::features::content_types::dtos as content_types_dtos;
use crate::features::file_types::{
    dtos as file_types_dtos, handlers as file_types_handlers, models as file_types_models,
};
use crate::shared::types::{ApiResponse, Meta};

/// Alias so the `OpenApi` derive can register `ApiResponse<()>` (it cannot parse `()` as a generic argument)
type EmptyApiResponse = ApiResponse<()>;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Attachments
        attachments_handlers::list_attachments,
        attachments_handlers::create_attachment,
        attachments_handlers::get_attachment,
        attachments_handlers::update_attachment,
        attachments_handlers::associate_attachment,
        attachments_handlers::upload_attachment,
        attachments_handlers::replace_attachment_file,
        attachments_handlers::redirect_to_file,
        attachments_handlers::list_owner_attachments,
        attachments_handlers::latest_owner_attachment,
        // Attachment links
        attachments_handlers::list_links,
        attachments_handlers::create_link,
        attachments_handlers::delete_link,
        // File types
        file_types_handlers::list_file_types,
        // Admin
        admin_handlers::list_attachments,
        admin_handlers::delete_attachment,
        admin_handlers::denormalize_attachments,
        admin_handlers::list_file_types,
        admin_handlers::create_file_type,
        admin_handlers::get_file_type,
        admin_handlers::update_file_type,
        admin_handlers::delete_file_type,
        admin_handlers::move_file_type,
        admin_handlers::cleanup_file_types,
        admin_handlers::list_content_types,
        admin_handlers::create_content_type,
    ),
    components(
        schemas(
            EmptyApiResponse,
            Meta,
            // Attachments
            attachments_dtos::CreateAttachmentDto,
            attachments_dtos::UpdateAttachmentDto,
            attachments_dtos::UploadFileDto,
            attachments_dtos::UploaderDto,
            attachments_dtos::AttachmentResponseDto,
            attachments_dtos::AttachmentFlatDto,
            attachments_dtos::AssociateAttachmentDto,
            attachments_dtos::OwnerAttachmentDto,
            attachments_dtos::LatestAttachmentDto,
            attachments_dtos::CreateLinkDto,
            attachments_dtos::AttachmentLinkResponseDto,
            // File types
            file_types_dtos::FileTypeResponseDto,
            file_types_dtos::CreateFileTypeDto,
            file_types_dtos::UpdateFileTypeDto,
            file_types_dtos::MoveDirection,
            file_types_dtos::CleanupReportDto,
            file_types_models::MergePlan,
            // Content types
            content_types_dtos::CreateContentTypeDto,
            content_types_dtos::ContentTypeResponseDto,
            // Admin
            admin_dtos::AdminAttachmentDto,
            admin_dtos::DenormalizeReportDto,
            admin_dtos::MoveFileTypeDto,
        )
    ),
    tags(
        (name = "attachments", description = "Files and hyperlinks attached to domain objects"),
        (name = "attachment-links", description = "Links of attachments to additional objects"),
        (name = "file-types", description = "File type choices"),
        (name = "admin", description = "Staff management endpoints"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Attachments API",
        version = "0.1.0",
        description = "API documentation for the attachments service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
