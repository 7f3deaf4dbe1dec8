use sqlx::FromRow;

use super::AttachmentDetail;
use crate::shared::constants::FLAT_DATE_FORMAT;

/// Row of the flat projection table
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentFlat {
    pub id: i64,
    pub attachment_id: i64,
    pub object_link: String,
    pub file_type: String,
    pub file_link: String,
    pub filename: String,
    pub uploaded_by: String,
    pub created: String,
}

/// Flat row joined with the live file type id of its attachment
#[derive(Debug, Clone, FromRow)]
pub struct FlatRow {
    #[sqlx(flatten)]
    pub flat: AttachmentFlat,
    pub file_type_id: Option<i64>,
}

/// Values written into the flat projection for one attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatValues {
    pub attachment_id: i64,
    pub object_link: String,
    pub file_type: String,
    pub file_link: String,
    pub filename: String,
    pub uploaded_by: String,
    pub created: String,
}

impl FlatValues {
    pub fn from_detail(detail: &AttachmentDetail) -> Self {
        let attachment = &detail.attachment;
        Self {
            attachment_id: attachment.id,
            object_link: detail.object_link(),
            file_type: detail.file_type_label(),
            file_link: attachment.file_link(),
            filename: attachment.filename(),
            uploaded_by: attachment.uploaded_by_name.clone().unwrap_or_default(),
            created: attachment.created.format(FLAT_DATE_FORMAT).to_string(),
        }
    }
}
