use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::core::error::Result;
use crate::core::extractor::RequestHost;
use crate::features::attachments::services::AttachmentService;

/// Redirect to the file or hyperlink of an attachment
#[utoipa::path(
    get,
    path = "/api/attachments/file/{id}",
    params(
        ("id" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 302, description = "Redirect to the content"),
        (status = 404, description = "Attachment not found or without content")
    ),
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn redirect_to_file(
    host: RequestHost,
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let url = service.content_url(id).await?;
    let location = host.absolute(&url)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
