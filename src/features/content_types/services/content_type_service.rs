use sqlx::PgPool;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::content_types::dtos::CreateContentTypeDto;
use crate::features::content_types::models::{ContentType, Owner};
use crate::shared::validation::{is_valid_identifier, APP_LABEL_REGEX, MODEL_REGEX};

const CONTENT_TYPE_COLUMNS: &str =
    "id, app_label, model, table_name, object_url_template, created_at";

/// Quote a validated `schema.table` identifier for interpolation
pub(crate) fn quote_identifier(identifier: &str) -> Result<String> {
    if !is_valid_identifier(identifier) {
        return Err(AppError::Configuration(format!(
            "'{}' is not a valid table name",
            identifier
        )));
    }

    Ok(identifier
        .split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join("."))
}

pub struct ContentTypeService {
    pool: PgPool,
}

impl ContentTypeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<ContentType>> {
        let sql = format!(
            "SELECT {} FROM content_types ORDER BY app_label, model",
            CONTENT_TYPE_COLUMNS
        );

        let content_types = sqlx::query_as::<_, ContentType>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(content_types)
    }

    pub async fn create(&self, dto: CreateContentTypeDto) -> Result<ContentType> {
        let sql = format!(
            r#"
            INSERT INTO content_types (app_label, model, table_name, object_url_template)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CONTENT_TYPE_COLUMNS
        );

        let content_type = sqlx::query_as::<_, ContentType>(&sql)
            .bind(&dto.app_label)
            .bind(dto.model.to_lowercase())
            .bind(&dto.table_name)
            .bind(&dto.object_url_template)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                handle_db_error(
                    e,
                    &format!(
                        "Content type '{}.{}' is already registered",
                        dto.app_label, dto.model
                    ),
                )
            })?;

        tracing::info!(
            "Registered content type {}.{} -> {}",
            content_type.app_label,
            content_type.model,
            content_type.table_name
        );

        Ok(content_type)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ContentType>> {
        let sql = format!(
            "SELECT {} FROM content_types WHERE id = $1",
            CONTENT_TYPE_COLUMNS
        );

        Ok(sqlx::query_as::<_, ContentType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Look up a content type by `(app_label, model)`; model matching is
    /// case-insensitive.
    pub async fn get_by_natural_key(&self, app_label: &str, model: &str) -> Result<ContentType> {
        if !APP_LABEL_REGEX.is_match(app_label) || !MODEL_REGEX.is_match(model) {
            return Err(AppError::NotFound("Not found.".to_string()));
        }

        let sql = format!(
            "SELECT {} FROM content_types WHERE app_label = $1 AND model = $2",
            CONTENT_TYPE_COLUMNS
        );

        sqlx::query_as::<_, ContentType>(&sql)
            .bind(app_label)
            .bind(model.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found.".to_string()))
    }

    pub async fn object_exists(&self, content_type: &ContentType, object_id: i64) -> Result<bool> {
        let table = quote_identifier(&content_type.table_name)?;
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table);

        // Target ids may be stored as INTEGER or BIGINT
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(object_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to check {}.{} object {}: {:?}",
                    content_type.app_label,
                    content_type.model,
                    object_id,
                    e
                );
                AppError::Database(e)
            })?;

        Ok(exists)
    }

    /// Resolve a URL triple into an existing owner, 404 otherwise
    pub async fn resolve_owner(&self, app_label: &str, model: &str, object_id: i64) -> Result<Owner> {
        let content_type = self.get_by_natural_key(app_label, model).await?;

        if !self.object_exists(&content_type, object_id).await? {
            return Err(AppError::NotFound("Not found.".to_string()));
        }

        Ok(Owner {
            content_type,
            object_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders").unwrap(), "\"orders\"");
        assert_eq!(
            quote_identifier("billing.invoices").unwrap(),
            "\"billing\".\"invoices\""
        );
        assert!(matches!(
            quote_identifier("orders\"; drop"),
            Err(AppError::Configuration(_))
        ));
    }
}
