use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::Result;
use crate::features::attachments::dtos::FlatQueryParams;
use crate::features::attachments::models::{AttachmentDetail, FlatRow, FlatValues};
use crate::features::content_types::services::quote_identifier;

/// Access to the configured flat projection table
#[derive(Clone)]
pub struct FlatStore {
    pool: PgPool,
    table: String,
}

impl FlatStore {
    pub fn new(pool: PgPool, table_name: &str) -> Result<Self> {
        Ok(Self {
            pool,
            table: quote_identifier(table_name)?,
        })
    }

    fn select_rows(&self) -> String {
        format!(
            "SELECT f.id, f.attachment_id, f.object_link, f.file_type, f.file_link, \
             f.filename, f.uploaded_by, f.created, a.file_type_id \
             FROM {} f JOIN attachments a ON a.id = f.attachment_id",
            self.table
        )
    }

    pub async fn upsert(&self, values: &FlatValues) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (attachment_id, object_link, file_type, file_link, filename, uploaded_by, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (attachment_id) DO UPDATE SET
                object_link = EXCLUDED.object_link,
                file_type = EXCLUDED.file_type,
                file_link = EXCLUDED.file_link,
                filename = EXCLUDED.filename,
                uploaded_by = EXCLUDED.uploaded_by,
                created = EXCLUDED.created
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(values.attachment_id)
            .bind(&values.object_link)
            .bind(&values.file_type)
            .bind(&values.file_link)
            .bind(&values.filename)
            .bind(&values.uploaded_by)
            .bind(&values.created)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create or refresh only the object link of a flat row
    pub async fn upsert_object_link(
        &self,
        attachment_id: i64,
        object_link: &str,
        created: &str,
    ) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (attachment_id, object_link, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (attachment_id) DO UPDATE SET object_link = EXCLUDED.object_link
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(attachment_id)
            .bind(object_link)
            .bind(created)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get(&self, attachment_id: i64) -> Result<Option<FlatRow>> {
        let sql = format!("{} WHERE f.attachment_id = $1", self.select_rows());

        Ok(sqlx::query_as::<_, FlatRow>(&sql)
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Flat rows of attachments that have a file or a hyperlink
    pub async fn list(&self, params: &FlatQueryParams) -> Result<Vec<FlatRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(self.select_rows());
        qb.push(" WHERE NOT ((a.file IS NULL OR a.file = '') AND a.hyperlink = '')");

        if let Some(id) = params.id {
            qb.push(" AND f.attachment_id = ").push_bind(id);
        }
        if let Some(file_type_id) = params.file_type_id {
            qb.push(" AND a.file_type_id = ").push_bind(file_type_id);
        }

        let text_filters = [
            ("f.object_link", &params.object_link),
            ("f.file_type", &params.file_type),
            ("f.file_link", &params.file_link),
            ("f.filename", &params.filename),
            ("f.uploaded_by", &params.uploaded_by),
            ("f.created", &params.created),
        ];
        for (column, value) in text_filters {
            if let Some(value) = value {
                qb.push(format!(" AND {} = ", column)).push_bind(value.clone());
            }
        }

        qb.push(" ORDER BY f.attachment_id");

        let rows = qb
            .build_query_as::<FlatRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list flat attachments: {:?}", e);
                e
            })?;

        Ok(rows)
    }

    /// Attachments without a flat row yet
    pub async fn missing(&self) -> Result<Vec<AttachmentDetail>> {
        let condition = format!(
            "WHERE NOT EXISTS (SELECT 1 FROM {} f WHERE f.attachment_id = a.id) ORDER BY a.id",
            self.table
        );

        Ok(
            sqlx::query_as::<_, AttachmentDetail>(&AttachmentDetail::select_sql(&condition))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Project every attachment that has no flat row, returning how many
    /// rows were written
    pub async fn denormalize_missing(&self) -> Result<usize> {
        let missing = self.missing().await?;

        for detail in &missing {
            self.upsert(&FlatValues::from_detail(detail)).await?;
        }

        tracing::info!("Denormalized {} attachment(s)", missing.len());
        Ok(missing.len())
    }
}
