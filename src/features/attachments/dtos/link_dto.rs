use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLinkDto {
    /// Id of the attachment to link
    pub attachment: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentLinkResponseDto {
    pub id: i64,
    pub attachment: i64,
    pub filename: String,
    pub url: String,
    pub file_type: Option<String>,
    /// Creation date of the attachment, `%d %b %Y`
    pub created: String,
}
