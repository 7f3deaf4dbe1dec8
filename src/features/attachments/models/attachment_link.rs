use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Additional target entity for an existing attachment
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentLink {
    pub id: i64,
    pub attachment_id: i64,
    pub content_type_id: Option<i64>,
    pub object_id: Option<i64>,
}

/// Link joined with the attachment fields its listing shows
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentLinkDetail {
    #[sqlx(flatten)]
    pub link: AttachmentLink,
    pub file: Option<String>,
    pub hyperlink: String,
    pub file_type_label: Option<String>,
    pub attachment_created: DateTime<Utc>,
}

impl AttachmentLinkDetail {
    pub(crate) const SELECT: &'static str = "SELECT l.id, l.attachment_id, l.content_type_id, \
        l.object_id, a.file, a.hyperlink, ft.label AS file_type_label, \
        a.created AS attachment_created \
        FROM attachment_links l \
        JOIN attachments a ON a.id = l.attachment_id \
        LEFT JOIN file_types ft ON ft.id = a.file_type_id";
}

impl std::fmt::Display for AttachmentLinkDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} link", self.file.as_deref().unwrap_or_default())
    }
}
