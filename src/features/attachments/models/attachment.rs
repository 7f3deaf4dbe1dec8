use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use url::Url;

use crate::core::error::{AppError, Result};
use crate::features::content_types::models::object_link;
use crate::shared::constants::FILE_LINK_PREFIX;
use crate::shared::text::basename;

/// File or hyperlink attached to an arbitrary entity
#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub file_type_id: Option<i64>,
    /// Storage key of the uploaded file
    pub file: Option<String>,
    pub hyperlink: String,
    pub content_type_id: Option<i64>,
    pub object_id: Option<i64>,
    pub code: String,
    /// Subject of the uploading user
    pub uploaded_by: Option<String>,
    pub uploaded_by_name: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

pub(crate) const ATTACHMENT_COLUMNS: &str = "a.id, a.file_type_id, a.file, a.hyperlink, \
    a.content_type_id, a.object_id, a.code, a.uploaded_by, a.uploaded_by_name, a.created, a.modified";

/// Exactly one of file and hyperlink must be present
pub fn ensure_file_or_hyperlink(has_file: bool, has_hyperlink: bool) -> Result<()> {
    if has_file == has_hyperlink {
        return Err(AppError::Validation(
            "Please provide file or hyperlink.".to_string(),
        ));
    }
    Ok(())
}

/// Path component of a hyperlink, also for relative links
fn hyperlink_path(hyperlink: &str) -> String {
    match Url::parse(hyperlink) {
        Ok(url) => url.path().to_string(),
        Err(_) => hyperlink
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Basename of the stored file, or of the hyperlink path
pub fn filename_of(file: Option<&str>, hyperlink: &str) -> String {
    match file.filter(|f| !f.is_empty()) {
        Some(file) => basename(file).to_string(),
        None => basename(&hyperlink_path(hyperlink)).to_string(),
    }
}

impl Attachment {
    pub fn has_file(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.is_empty())
    }

    pub fn has_hyperlink(&self) -> bool {
        !self.hyperlink.is_empty()
    }

    pub fn filename(&self) -> String {
        filename_of(self.file.as_deref(), &self.hyperlink)
    }

    /// Service route that redirects to the content
    pub fn file_link(&self) -> String {
        format!("{}/{}", FILE_LINK_PREFIX, self.id)
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Attachment>> {
        let sql = format!("SELECT {} FROM attachments a WHERE a.id = $1", ATTACHMENT_COLUMNS);
        Ok(sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }
}

impl std::fmt::Display for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file.as_deref().unwrap_or_default())
    }
}

/// Attachment joined with its file type and owner content type
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentDetail {
    #[sqlx(flatten)]
    pub attachment: Attachment,
    pub file_type_label: Option<String>,
    pub app_label: Option<String>,
    pub model: Option<String>,
    pub object_url_template: Option<String>,
}

impl AttachmentDetail {
    pub(crate) const SELECT: &'static str = "FROM attachments a \
        LEFT JOIN file_types ft ON ft.id = a.file_type_id \
        LEFT JOIN content_types ct ON ct.id = a.content_type_id";

    pub(crate) fn select_sql(condition: &str) -> String {
        format!(
            "SELECT {}, ft.label AS file_type_label, ct.app_label, ct.model, ct.object_url_template {} {}",
            ATTACHMENT_COLUMNS,
            Self::SELECT,
            condition
        )
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<AttachmentDetail>> {
        Ok(
            sqlx::query_as::<_, AttachmentDetail>(&Self::select_sql("WHERE a.id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// Link to the owning object, empty when unowned or not linkable
    pub fn object_link(&self) -> String {
        self.attachment
            .object_id
            .map(|id| object_link(self.object_url_template.as_deref(), id))
            .unwrap_or_default()
    }

    pub fn file_type_label(&self) -> String {
        self.file_type_label.clone().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn attachment(file: Option<&str>, hyperlink: &str) -> Attachment {
        let created = DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Attachment {
            id: 12,
            file_type_id: None,
            file: file.map(|f| f.to_string()),
            hyperlink: hyperlink.to_string(),
            content_type_id: None,
            object_id: None,
            code: String::new(),
            uploaded_by: None,
            uploaded_by_name: None,
            created,
            modified: created,
        }
    }

    #[test]
    fn test_filename_from_file() {
        let a = attachment(Some("files/shop/order/1/report.pdf"), "");
        assert_eq!(a.filename(), "report.pdf");
        assert_eq!(a.to_string(), "files/shop/order/1/report.pdf");
    }

    #[test]
    fn test_filename_from_hyperlink_path() {
        let a = attachment(None, "https://example.com/docs/manual.pdf?version=2#page=3");
        assert_eq!(a.filename(), "manual.pdf");

        let relative = attachment(None, "docs/notes.txt?x=1");
        assert_eq!(relative.filename(), "notes.txt");

        let bare = attachment(None, "https://example.com");
        assert_eq!(bare.filename(), "");
    }

    #[test]
    fn test_file_link() {
        assert_eq!(attachment(None, "x").file_link(), "/api/attachments/file/12");
    }

    #[test]
    fn test_file_or_hyperlink_required() {
        let check = |a: Attachment| ensure_file_or_hyperlink(a.has_file(), a.has_hyperlink());

        assert!(check(attachment(None, "")).is_err());
        assert!(check(attachment(Some("a.txt"), "https://example.com")).is_err());
        assert!(check(attachment(Some(""), "")).is_err());
        assert!(check(attachment(Some("a.txt"), "")).is_ok());
        assert!(check(attachment(None, "https://example.com")).is_ok());

        match ensure_file_or_hyperlink(false, false) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Please provide file or hyperlink."),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn test_detail_object_link() {
        let detail = AttachmentDetail {
            attachment: Attachment {
                object_id: Some(9),
                ..attachment(Some("a.txt"), "")
            },
            file_type_label: Some("Report".to_string()),
            app_label: Some("shop".to_string()),
            model: Some("order".to_string()),
            object_url_template: Some("/orders/{id}/".to_string()),
        };
        assert_eq!(detail.object_link(), "/orders/9/");
        assert_eq!(detail.file_type_label(), "Report");

        let unowned = AttachmentDetail {
            object_url_template: None,
            ..detail
        };
        assert_eq!(unowned.object_link(), "");
    }
}
