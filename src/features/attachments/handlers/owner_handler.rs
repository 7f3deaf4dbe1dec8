use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::RequestHost;
use crate::features::attachments::dtos::{
    LatestAttachmentDto, OwnerAttachmentDto, OwnerQueryParams,
};
use crate::features::attachments::services::AttachmentService;
use crate::features::content_types::ContentTypeService;
use crate::shared::types::{ApiResponse, Meta};

/// Attachment summaries of an owner object
#[utoipa::path(
    get,
    path = "/api/attachments/owner/{app_label}/{model}/{object_id}",
    params(
        ("app_label" = String, Path, description = "Application label of the owner"),
        ("model" = String, Path, description = "Model name of the owner"),
        ("object_id" = i64, Path, description = "Owner id"),
        OwnerQueryParams
    ),
    responses(
        (status = 200, description = "Attachments of the object", body = ApiResponse<Vec<OwnerAttachmentDto>>),
        (status = 404, description = "Unknown content type or object")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_owner_attachments(
    State(service): State<Arc<AttachmentService>>,
    State(content_types): State<Arc<ContentTypeService>>,
    Path((app_label, model, object_id)): Path<(String, String, i64)>,
    Query(params): Query<OwnerQueryParams>,
) -> Result<Json<ApiResponse<Vec<OwnerAttachmentDto>>>> {
    let owner = content_types
        .resolve_owner(&app_label, &model, object_id)
        .await?;
    let attachments = service
        .list_for_owner(&owner, params.code.as_deref())
        .await?;
    let total = attachments.len();

    Ok(Json(ApiResponse::success(
        Some(attachments),
        None,
        Meta::total(total),
    )))
}

/// Absolute file link of the most recent attachment of an owner
#[utoipa::path(
    get,
    path = "/api/attachments/owner/{app_label}/{model}/{object_id}/latest",
    params(
        ("app_label" = String, Path, description = "Application label of the owner"),
        ("model" = String, Path, description = "Model name of the owner"),
        ("object_id" = i64, Path, description = "Owner id"),
        OwnerQueryParams
    ),
    responses(
        (status = 200, description = "Latest file link, null when none", body = ApiResponse<LatestAttachmentDto>),
        (status = 404, description = "Unknown content type or object")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn latest_owner_attachment(
    host: RequestHost,
    State(service): State<Arc<AttachmentService>>,
    State(content_types): State<Arc<ContentTypeService>>,
    Path((app_label, model, object_id)): Path<(String, String, i64)>,
    Query(params): Query<OwnerQueryParams>,
) -> Result<Json<ApiResponse<LatestAttachmentDto>>> {
    let owner = content_types
        .resolve_owner(&app_label, &model, object_id)
        .await?;

    let file_link = service
        .latest_file_link(&owner, params.code.as_deref().unwrap_or_default())
        .await?
        .map(|link| host.absolute(&link))
        .transpose()?;

    Ok(Json(ApiResponse::success(
        Some(LatestAttachmentDto { file_link }),
        None,
        None,
    )))
}
