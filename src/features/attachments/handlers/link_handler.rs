use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::attachments::dtos::{AttachmentLinkResponseDto, CreateLinkDto};
use crate::features::attachments::services::LinkService;
use crate::features::content_types::ContentTypeService;
use crate::shared::types::{ApiResponse, Meta};

#[utoipa::path(
    get,
    path = "/api/attachments/links/{app_label}/{model}/{object_id}",
    params(
        ("app_label" = String, Path, description = "Application label of the owner"),
        ("model" = String, Path, description = "Model name of the owner"),
        ("object_id" = i64, Path, description = "Owner id")
    ),
    responses(
        (status = 200, description = "Links of the object", body = ApiResponse<Vec<AttachmentLinkResponseDto>>),
        (status = 404, description = "Unknown content type or object")
    ),
    tag = "attachment-links",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_links(
    State(links): State<Arc<LinkService>>,
    State(content_types): State<Arc<ContentTypeService>>,
    Path((app_label, model, object_id)): Path<(String, String, i64)>,
) -> Result<Json<ApiResponse<Vec<AttachmentLinkResponseDto>>>> {
    let owner = content_types
        .resolve_owner(&app_label, &model, object_id)
        .await?;
    let links = links.list(&owner).await?;
    let total = links.len();

    Ok(Json(ApiResponse::success(Some(links), None, Meta::total(total))))
}

/// Link an existing attachment to another object
#[utoipa::path(
    post,
    path = "/api/attachments/links/{app_label}/{model}/{object_id}",
    params(
        ("app_label" = String, Path, description = "Application label of the owner"),
        ("model" = String, Path, description = "Model name of the owner"),
        ("object_id" = i64, Path, description = "Owner id")
    ),
    request_body = CreateLinkDto,
    responses(
        (status = 201, description = "Link created", body = ApiResponse<AttachmentLinkResponseDto>),
        (status = 400, description = "Attachment does not exist"),
        (status = 404, description = "Unknown content type or object")
    ),
    tag = "attachment-links",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_link(
    State(links): State<Arc<LinkService>>,
    State(content_types): State<Arc<ContentTypeService>>,
    Path((app_label, model, object_id)): Path<(String, String, i64)>,
    AppJson(dto): AppJson<CreateLinkDto>,
) -> Result<(StatusCode, Json<ApiResponse<AttachmentLinkResponseDto>>)> {
    let owner = content_types
        .resolve_owner(&app_label, &model, object_id)
        .await?;
    let link = links.create(&owner, dto.attachment).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(link), None, None)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/attachments/links/{id}",
    params(
        ("id" = i64, Path, description = "Link id")
    ),
    responses(
        (status = 204, description = "Link deleted"),
        (status = 404, description = "Link not found")
    ),
    tag = "attachment-links",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_link(
    State(links): State<Arc<LinkService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    links.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
