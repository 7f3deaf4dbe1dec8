use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireStaff;
use crate::features::content_types::dtos::{ContentTypeResponseDto, CreateContentTypeDto};
use crate::features::content_types::ContentTypeService;
use crate::features::file_types::dtos::{
    CleanupReportDto, CreateFileTypeDto, FileTypeQueryParams, FileTypeResponseDto,
    UpdateFileTypeDto,
};
use crate::features::file_types::FileTypeService;
use crate::shared::types::{ApiResponse, Meta};

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// List attachments (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/attachments",
    params(AdminAttachmentQueryParams),
    responses(
        (status = 200, description = "List of attachments", body = ApiResponse<Vec<AdminAttachmentDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_attachments(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<AdminAttachmentQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminAttachmentDto>>>> {
    let (items, total) = service.list_attachments(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/attachments/{id}",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 404, description = "Attachment not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_attachment(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete_attachment(id).await?;
    tracing::info!("Attachment {} deleted by {}", id, user.sub);
    Ok(StatusCode::NO_CONTENT)
}

/// Project every attachment without a flat row
#[utoipa::path(
    post,
    path = "/api/admin/attachments/denormalize",
    responses(
        (status = 200, description = "Flat rows written", body = ApiResponse<DenormalizeReportDto>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn denormalize_attachments(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<DenormalizeReportDto>>> {
    let denormalized = service.denormalize_all().await?;

    Ok(Json(ApiResponse::success(
        Some(DenormalizeReportDto { denormalized }),
        Some(format!("Denormalized {} attachment(s)", denormalized)),
        None,
    )))
}

// =============================================================================
// FILE TYPES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/file-types",
    params(FileTypeQueryParams),
    responses(
        (status = 200, description = "List of file types", body = ApiResponse<Vec<FileTypeResponseDto>>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_file_types(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    Query(params): Query<FileTypeQueryParams>,
) -> Result<Json<ApiResponse<Vec<FileTypeResponseDto>>>> {
    let items: Vec<FileTypeResponseDto> = service
        .list(&params)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();

    Ok(Json(ApiResponse::success(Some(items), None, Meta::total(total))))
}

#[utoipa::path(
    post,
    path = "/api/admin/file-types",
    request_body = CreateFileTypeDto,
    responses(
        (status = 201, description = "File type created", body = ApiResponse<FileTypeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 409, description = "File type with this name and code already exists")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_file_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    AppJson(dto): AppJson<CreateFileTypeDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileTypeResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file_type = service.create(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(file_type.into()),
            Some("File type created".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/file-types/{id}",
    params(
        ("id" = i64, Path, description = "File type id")
    ),
    responses(
        (status = 200, description = "File type", body = ApiResponse<FileTypeResponseDto>),
        (status = 403, description = "Forbidden - Staff access required"),
        (status = 404, description = "File type not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileTypeResponseDto>>> {
    let file_type = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(file_type.into()), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/file-types/{id}",
    params(
        ("id" = i64, Path, description = "File type id")
    ),
    request_body = UpdateFileTypeDto,
    responses(
        (status = 200, description = "File type updated", body = ApiResponse<FileTypeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "File type not found"),
        (status = 409, description = "File type with this name and code already exists")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_file_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateFileTypeDto>,
) -> Result<Json<ApiResponse<FileTypeResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file_type = service.update(id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(file_type.into()),
        Some("File type updated".to_string()),
        None,
    )))
}

/// Delete a file type together with its attachments
#[utoipa::path(
    delete,
    path = "/api/admin/file-types/{id}",
    params(
        ("id" = i64, Path, description = "File type id")
    ),
    responses(
        (status = 204, description = "File type deleted"),
        (status = 404, description = "File type not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a file type one step up or down in the ordering
#[utoipa::path(
    post,
    path = "/api/admin/file-types/{id}/move",
    params(
        ("id" = i64, Path, description = "File type id")
    ),
    request_body = MoveFileTypeDto,
    responses(
        (status = 200, description = "File type moved", body = ApiResponse<FileTypeResponseDto>),
        (status = 404, description = "File type not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_file_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<MoveFileTypeDto>,
) -> Result<Json<ApiResponse<FileTypeResponseDto>>> {
    let file_type = service.move_file_type(id, dto.direction).await?;
    Ok(Json(ApiResponse::success(Some(file_type.into()), None, None)))
}

/// Merge file types that share a label or name
#[utoipa::path(
    post,
    path = "/api/admin/file-types/cleanup",
    responses(
        (status = 200, description = "Duplicates merged", body = ApiResponse<CleanupReportDto>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cleanup_file_types(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileTypeService>>,
) -> Result<Json<ApiResponse<CleanupReportDto>>> {
    let report = service.cleanup_duplicates().await?;
    let message = format!("Removed {} duplicate file type(s)", report.removed);

    Ok(Json(ApiResponse::success(Some(report), Some(message), None)))
}

// =============================================================================
// CONTENT TYPES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/content-types",
    responses(
        (status = 200, description = "Registered content types", body = ApiResponse<Vec<ContentTypeResponseDto>>),
        (status = 403, description = "Forbidden - Staff access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_content_types(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<ContentTypeService>>,
) -> Result<Json<ApiResponse<Vec<ContentTypeResponseDto>>>> {
    let items: Vec<ContentTypeResponseDto> =
        service.list().await?.into_iter().map(Into::into).collect();
    let total = items.len();

    Ok(Json(ApiResponse::success(Some(items), None, Meta::total(total))))
}

/// Register a table whose rows can own attachments
#[utoipa::path(
    post,
    path = "/api/admin/content-types",
    request_body = CreateContentTypeDto,
    responses(
        (status = 201, description = "Content type registered", body = ApiResponse<ContentTypeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Content type already registered")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_content_type(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<ContentTypeService>>,
    AppJson(dto): AppJson<CreateContentTypeDto>,
) -> Result<(StatusCode, Json<ApiResponse<ContentTypeResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let content_type = service.create(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(content_type.into()),
            Some("Content type registered".to_string()),
            None,
        )),
    ))
}
