use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Attach an uploaded attachment to an owner object under `code`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssociateAttachmentDto {
    #[validate(length(min = 1, max = 100))]
    pub app_label: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    pub object_id: i64,

    #[validate(length(max = 64))]
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct OwnerQueryParams {
    /// Only attachments stored under this code
    pub code: Option<String>,
}

/// Compact attachment summary of an owner, e.g. for printed documents
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerAttachmentDto {
    pub file_type_display: Option<String>,
    pub filename: String,
    pub url: String,
    /// `%d %b %Y`
    pub created: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LatestAttachmentDto {
    /// Absolute file link of the most recent attachment, null when none
    pub file_link: Option<String>,
}
