use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::{AttachmentFlatDto, UploadFileDto};
use crate::features::attachments::services::{AttachmentService, UploadedFile};
use crate::features::auth::guards::MaybeUser;
use crate::shared::constants::UNNAMED_FILE;
use crate::shared::types::ApiResponse;

/// Client file name of an upload part, `unnamed` when missing or blank
fn upload_file_name(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNNAMED_FILE)
        .to_string()
}

/// Read the `file` part of a multipart body; other parts are ignored
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let file_name = upload_file_name(field.file_name());

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))
}

/// Upload a file as a new owner-less attachment
#[utoipa::path(
    post,
    path = "/api/attachments/upload",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Multipart form with a single `file` part"
    ),
    responses(
        (status = 200, description = "File uploaded", body = ApiResponse<AttachmentFlatDto>),
        (status = 400, description = "Missing file or unsupported file type"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Permission denied")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_attachment(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<AttachmentService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<AttachmentFlatDto>>> {
    let upload = read_upload(multipart).await?;
    let attachment = service.upload(user.as_ref(), upload).await?;

    Ok(Json(ApiResponse::success(
        Some(attachment),
        Some("File uploaded successfully".to_string()),
        None,
    )))
}

/// Replace the file of an attachment. The caller becomes its uploader.
#[utoipa::path(
    put,
    path = "/api/attachments/upload/{id}",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Multipart form with a single `file` part"
    ),
    responses(
        (status = 200, description = "File replaced", body = ApiResponse<AttachmentFlatDto>),
        (status = 400, description = "Missing file or unsupported file type"),
        (status = 404, description = "Attachment not found")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_attachment_file(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<AttachmentFlatDto>>> {
    let upload = read_upload(multipart).await?;
    let attachment = service.replace_upload(id, user.as_ref(), upload).await?;

    Ok(Json(ApiResponse::success(
        Some(attachment),
        Some("File replaced successfully".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_file_name_defaults_to_unnamed() {
        assert_eq!(upload_file_name(Some("report..v2.pdf")), "report..v2.pdf");
        assert_eq!(upload_file_name(Some("")), "unnamed");
        assert_eq!(upload_file_name(Some("   ")), "unnamed");
        assert_eq!(upload_file_name(None), "unnamed");
    }
}
