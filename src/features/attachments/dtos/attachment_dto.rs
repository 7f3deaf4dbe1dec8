use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// JSON create request. `file` is a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAttachmentDto {
    #[schema(value_type = Option<String>, example = "data:text/plain;base64,aGVsbG8=")]
    pub file: Option<serde_json::Value>,

    /// Overrides the generated `{uuid}.{ext}` name of a base64 file
    #[validate(length(min = 1, max = 255))]
    pub file_name: Option<String>,

    #[validate(length(max = 255))]
    pub hyperlink: Option<String>,

    pub file_type: Option<i64>,
}

/// JSON partial update, same rules as create
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAttachmentDto {
    #[schema(value_type = Option<String>)]
    pub file: Option<serde_json::Value>,

    #[validate(length(min = 1, max = 255))]
    pub file_name: Option<String>,

    #[validate(length(max = 255))]
    pub hyperlink: Option<String>,

    pub file_type: Option<i64>,
}

/// Multipart body of the upload endpoints, for Swagger UI only.
/// The handlers read the `Multipart` extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploaderDto {
    pub sub: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: i64,
    pub file_type: Option<i64>,
    /// URL of the stored file
    pub file: Option<String>,
    pub hyperlink: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub uploaded_by: Option<UploaderDto>,
    pub filename: String,
}
