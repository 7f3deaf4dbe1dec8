use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::attachments::models::FlatRow;

/// Flat projection row as served by the list and upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentFlatDto {
    /// Attachment id
    pub id: i64,
    pub attachment: i64,
    pub file_type_id: Option<i64>,
    pub object_link: String,
    pub file_type: String,
    pub file_link: String,
    pub filename: String,
    pub uploaded_by: String,
    pub created: String,
}

impl From<FlatRow> for AttachmentFlatDto {
    fn from(row: FlatRow) -> Self {
        let flat = row.flat;
        Self {
            id: flat.attachment_id,
            attachment: flat.attachment_id,
            file_type_id: row.file_type_id,
            object_link: flat.object_link,
            file_type: flat.file_type,
            file_link: flat.file_link,
            filename: flat.filename,
            uploaded_by: flat.uploaded_by,
            created: flat.created,
        }
    }
}

/// Exact-match filters over the flat fields
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FlatQueryParams {
    /// Attachment id
    pub id: Option<i64>,
    pub file_type_id: Option<i64>,
    pub object_link: Option<String>,
    pub file_type: Option<String>,
    pub file_link: Option<String>,
    pub filename: Option<String>,
    pub uploaded_by: Option<String>,
    /// Creation date as `%d %b %Y`, e.g. "05 Mar 2024"
    pub created: Option<String>,
}
