use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Registered entity type that attachments can point at
#[derive(Debug, Clone, FromRow)]
pub struct ContentType {
    pub id: i64,
    pub app_label: String,
    pub model: String,
    pub table_name: String,
    pub object_url_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Render an object URL template, empty when no template is registered
pub fn object_link(template: Option<&str>, object_id: i64) -> String {
    template
        .map(|template| template.replace("{id}", &object_id.to_string()))
        .unwrap_or_default()
}

/// A concrete target entity: content type plus row id
#[derive(Debug, Clone)]
pub struct Owner {
    pub content_type: ContentType,
    pub object_id: i64,
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} object ({})",
            self.content_type.app_label, self.content_type.model, self.object_id
        )
    }
}
