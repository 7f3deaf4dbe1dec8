use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::file_types::dtos::{FileTypeQueryParams, FileTypeResponseDto};
use crate::features::file_types::services::FileTypeService;
use crate::shared::types::{ApiResponse, Meta};

/// File type choices for attachment forms
#[utoipa::path(
    get,
    path = "/api/file-types",
    params(FileTypeQueryParams),
    responses(
        (status = 200, description = "File types ordered by code and order", body = ApiResponse<Vec<FileTypeResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    tag = "file-types",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_file_types(
    State(service): State<Arc<FileTypeService>>,
    Query(params): Query<FileTypeQueryParams>,
) -> Result<Json<ApiResponse<Vec<FileTypeResponseDto>>>> {
    let file_types: Vec<FileTypeResponseDto> = service
        .list(&params)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = file_types.len();
    Ok(Json(ApiResponse::success(
        Some(file_types),
        None,
        Meta::total(total),
    )))
}
