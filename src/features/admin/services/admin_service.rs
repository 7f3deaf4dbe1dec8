use std::sync::Arc;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::{AdminAttachmentDto, AdminAttachmentQueryParams};
use crate::features::attachments::models::AttachmentDetail;
use crate::features::attachments::AttachmentService;

/// Service for admin queries over attachments
pub struct AdminService {
    pool: PgPool,
    attachments: Arc<AttachmentService>,
}

/// Append the listing filters; `a` is attachments and `ct` content types
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &AdminAttachmentQueryParams) {
    builder.push(" WHERE TRUE");

    if let Some(file_type_id) = params.file_type_id {
        builder.push(" AND a.file_type_id = ").push_bind(file_type_id);
    }
    if let Some(uploaded_by) = &params.uploaded_by {
        builder.push(" AND a.uploaded_by = ").push_bind(uploaded_by.clone());
    }
    if let Some(app_label) = &params.app_label {
        builder.push(" AND ct.app_label = ").push_bind(app_label.clone());
    }
    if let Some(model) = &params.model {
        builder
            .push(" AND ct.model = ")
            .push_bind(model.to_lowercase());
    }
    if let Some(object_id) = params.object_id {
        builder.push(" AND a.object_id = ").push_bind(object_id);
    }
    if let Some(code) = &params.code {
        builder.push(" AND a.code = ").push_bind(code.clone());
    }
}

impl AdminService {
    pub fn new(pool: PgPool, attachments: Arc<AttachmentService>) -> Self {
        Self { pool, attachments }
    }

    // =========================================================================
    // ATTACHMENTS
    // =========================================================================

    /// List attachments with filters and pagination, newest first
    pub async fn list_attachments(
        &self,
        params: &AdminAttachmentQueryParams,
    ) -> Result<(Vec<AdminAttachmentDto>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM attachments a \
             LEFT JOIN content_types ct ON ct.id = a.content_type_id",
        );
        push_filters(&mut count, params);

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count attachments: {:?}", e);
                AppError::Database(e)
            })?;

        let pagination = params.pagination();
        let mut select = QueryBuilder::<Postgres>::new(AttachmentDetail::select_sql(""));
        push_filters(&mut select, params);
        select
            .push(" ORDER BY a.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = select
            .build_query_as::<AttachmentDetail>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list attachments: {:?}", e);
                AppError::Database(e)
            })?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let file = if row.attachment.has_file() {
                Some(self.attachments.url(&row.attachment).await?)
            } else {
                None
            };
            let object_link = row.object_link();
            let a = row.attachment;

            items.push(AdminAttachmentDto {
                id: a.id,
                file_type_id: a.file_type_id,
                file_type: row.file_type_label,
                filename: a.filename(),
                file,
                hyperlink: a.hyperlink,
                app_label: row.app_label,
                model: row.model,
                object_id: a.object_id,
                object_link,
                code: a.code,
                uploaded_by: a.uploaded_by,
                uploaded_by_name: a.uploaded_by_name,
                created: a.created,
                modified: a.modified,
            });
        }

        Ok((items, total))
    }

    pub async fn delete_attachment(&self, id: i64) -> Result<()> {
        self.attachments.delete(id).await
    }

    /// Write flat rows for every attachment that has none yet
    pub async fn denormalize_all(&self) -> Result<usize> {
        self.attachments.flat_store().denormalize_missing().await
    }
}
