use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::features::content_types::models::ContentType;
use crate::shared::validation::{is_valid_identifier, APP_LABEL_REGEX, MODEL_REGEX};

fn validate_table_name(value: &str) -> Result<(), ValidationError> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(ValidationError::new("table_name")
            .with_message("table_name must be a plain SQL identifier".into()))
    }
}

/// Register a target entity type
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContentTypeDto {
    #[validate(length(min = 1, max = 100), regex(path = *APP_LABEL_REGEX))]
    pub app_label: String,

    #[validate(length(min = 1, max = 100), regex(path = *MODEL_REGEX))]
    pub model: String,

    #[validate(length(min = 1, max = 128), custom(function = "validate_table_name"))]
    pub table_name: String,

    /// Link template, `{id}` is replaced with the object id
    #[validate(length(max = 1024))]
    pub object_url_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentTypeResponseDto {
    pub id: i64,
    pub app_label: String,
    pub model: String,
    pub table_name: String,
    pub object_url_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ContentType> for ContentTypeResponseDto {
    fn from(ct: ContentType) -> Self {
        Self {
            id: ct.id,
            app_label: ct.app_label,
            model: ct.model,
            table_name: ct.table_name,
            object_url_template: ct.object_url_template,
            created_at: ct.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(app_label: &str, model: &str, table_name: &str) -> CreateContentTypeDto {
        CreateContentTypeDto {
            app_label: app_label.to_string(),
            model: model.to_string(),
            table_name: table_name.to_string(),
            object_url_template: None,
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(dto("shop", "order", "orders").validate().is_ok());
        assert!(dto("shop.billing", "invoice", "billing.invoices")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_invalid_registration() {
        assert!(dto("shop/x", "order", "orders").validate().is_err());
        assert!(dto("shop", "order-line", "orders").validate().is_err());
        assert!(dto("shop", "order", "orders; drop table x")
            .validate()
            .is_err());
    }
}
