use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::attachments::dtos::{
    AssociateAttachmentDto, AttachmentFlatDto, AttachmentResponseDto, CreateAttachmentDto,
    FlatQueryParams, UpdateAttachmentDto,
};
use crate::features::attachments::services::AttachmentService;
use crate::features::auth::guards::MaybeUser;
use crate::features::content_types::ContentTypeService;
use crate::shared::types::{ApiResponse, Meta};

/// List attachments from the flat projection
#[utoipa::path(
    get,
    path = "/api/attachments",
    params(FlatQueryParams),
    responses(
        (status = 200, description = "Attachments with a file or hyperlink", body = ApiResponse<Vec<AttachmentFlatDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Permission denied")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_attachments(
    State(service): State<Arc<AttachmentService>>,
    Query(params): Query<FlatQueryParams>,
) -> Result<Json<ApiResponse<Vec<AttachmentFlatDto>>>> {
    let attachments = service.list_flat(&params).await?;
    let total = attachments.len();

    Ok(Json(ApiResponse::success(
        Some(attachments),
        None,
        Meta::total(total),
    )))
}

/// Create an attachment from a base64 file or a hyperlink
#[utoipa::path(
    post,
    path = "/api/attachments",
    request_body = CreateAttachmentDto,
    responses(
        (status = 201, description = "Attachment created", body = ApiResponse<AttachmentResponseDto>),
        (status = 400, description = "Neither or both of file and hyperlink, or bad base64"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Permission denied")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_attachment(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<AttachmentService>>,
    AppJson(dto): AppJson<CreateAttachmentDto>,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let attachment = service.create(user.as_ref(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(attachment),
            Some("Attachment created".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/attachments/{id}",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 200, description = "Attachment detail", body = ApiResponse<AttachmentResponseDto>),
        (status = 404, description = "Attachment not found")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_attachment(
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AttachmentResponseDto>>> {
    let attachment = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(attachment), None, None)))
}

/// Partially update an attachment
#[utoipa::path(
    patch,
    path = "/api/attachments/{id}",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    request_body = UpdateAttachmentDto,
    responses(
        (status = 200, description = "Attachment updated", body = ApiResponse<AttachmentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Attachment not found")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_attachment(
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateAttachmentDto>,
) -> Result<Json<ApiResponse<AttachmentResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let attachment = service.update(id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(attachment),
        Some("Attachment updated".to_string()),
        None,
    )))
}

/// Give an uploaded attachment to an owner object under a code
#[utoipa::path(
    put,
    path = "/api/attachments/{id}/owner",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    request_body = AssociateAttachmentDto,
    responses(
        (status = 200, description = "Attachment associated", body = ApiResponse<AttachmentResponseDto>),
        (status = 400, description = "Unknown attachment or already associated elsewhere"),
        (status = 404, description = "Unknown content type or object")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn associate_attachment(
    State(service): State<Arc<AttachmentService>>,
    State(content_types): State<Arc<ContentTypeService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<AssociateAttachmentDto>,
) -> Result<Json<ApiResponse<AttachmentResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let owner = content_types
        .resolve_owner(&dto.app_label, &dto.model, dto.object_id)
        .await?;
    let attachment = service.associate(id, &owner, &dto.code).await?;

    Ok(Json(ApiResponse::success(
        Some(attachment),
        Some("Attachment associated".to_string()),
        None,
    )))
}
