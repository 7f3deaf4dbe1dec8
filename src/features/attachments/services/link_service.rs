use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::attachments::dtos::AttachmentLinkResponseDto;
use crate::features::attachments::models::{filename_of, Attachment, AttachmentLinkDetail};
use crate::features::content_types::Owner;
use crate::modules::storage::FileStorage;
use crate::shared::constants::FLAT_DATE_FORMAT;

/// Links of existing attachments to additional objects
pub struct LinkService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl LinkService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    pub async fn list(&self, owner: &Owner) -> Result<Vec<AttachmentLinkResponseDto>> {
        let sql = format!(
            "{} WHERE l.content_type_id = $1 AND l.object_id = $2 ORDER BY l.id",
            AttachmentLinkDetail::SELECT
        );

        let links = sqlx::query_as::<_, AttachmentLinkDetail>(&sql)
            .bind(owner.content_type.id)
            .bind(owner.object_id)
            .fetch_all(&self.pool)
            .await?;

        let mut dtos = Vec::with_capacity(links.len());
        for link in links {
            dtos.push(self.to_response(link).await?);
        }

        Ok(dtos)
    }

    pub async fn create(
        &self,
        owner: &Owner,
        attachment_id: i64,
    ) -> Result<AttachmentLinkResponseDto> {
        if Attachment::find(&self.pool, attachment_id).await?.is_none() {
            return Err(AppError::BadRequest(
                "Attachment does not exist".to_string(),
            ));
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO attachment_links (attachment_id, content_type_id, object_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(attachment_id)
        .bind(owner.content_type.id)
        .bind(owner.object_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Attachment link already exists"))?;

        info!("Linked attachment {} to {}", attachment_id, owner);

        let sql = format!("{} WHERE l.id = $1", AttachmentLinkDetail::SELECT);
        let link = sqlx::query_as::<_, AttachmentLinkDetail>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        self.to_response(link).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM attachment_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "No AttachmentLink matches the given query.".to_string(),
            ));
        }

        info!("Deleted attachment link {}", id);
        Ok(())
    }

    async fn to_response(&self, link: AttachmentLinkDetail) -> Result<AttachmentLinkResponseDto> {
        let url = match link.file.as_deref().filter(|f| !f.is_empty()) {
            Some(key) => self.storage.url(key).await?,
            None => link.hyperlink.clone(),
        };

        Ok(AttachmentLinkResponseDto {
            id: link.link.id,
            attachment: link.link.attachment_id,
            filename: filename_of(link.file.as_deref(), &link.hyperlink),
            url,
            file_type: link.file_type_label,
            created: link.attachment_created.format(FLAT_DATE_FORMAT).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::attachments::dtos::CreateAttachmentDto;
    use crate::shared::test_helpers::{attachments_state, create_authors, owner};

    #[sqlx::test(migrations = "./migrations")]
    async fn test_link_lifecycle(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let state = attachments_state(pool.clone(), dir.path());
        let authors = create_authors(&pool, 2).await;
        let author = owner(&authors, 2);

        let attachment = state
            .attachments
            .create(
                None,
                CreateAttachmentDto {
                    file: None,
                    file_name: None,
                    hyperlink: Some("https://example.com/files/contract.pdf".to_string()),
                    file_type: None,
                },
            )
            .await
            .unwrap();

        let link = state.links.create(&author, attachment.id).await.unwrap();
        assert_eq!(link.attachment, attachment.id);
        assert_eq!(link.filename, "contract.pdf");
        assert_eq!(link.url, "https://example.com/files/contract.pdf");

        let listed = state.links.list(&author).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, link.id);
        assert!(state.links.list(&owner(&authors, 1)).await.unwrap().is_empty());

        state.links.delete(link.id).await.unwrap();
        assert!(state.links.list(&author).await.unwrap().is_empty());
        assert!(matches!(
            state.links.delete(link.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_link_requires_existing_attachment(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let state = attachments_state(pool.clone(), dir.path());
        let authors = create_authors(&pool, 1).await;

        let err = state.links.create(&owner(&authors, 1), 404).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Attachment does not exist"));
    }
}
