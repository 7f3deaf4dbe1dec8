use std::sync::Arc;

use bytes::Bytes;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use super::base64_file::{decode_base64_file, Base64File};
use super::file_path::generate_file_path;
use super::flat_service::FlatStore;
use super::safe_file::SafeFileValidator;
use crate::core::config::AttachmentConfig;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::attachments::dtos::{
    AttachmentFlatDto, AttachmentResponseDto, CreateAttachmentDto, FlatQueryParams,
    OwnerAttachmentDto, UpdateAttachmentDto, UploaderDto,
};
use crate::features::attachments::extensions::{Denormalizer, Extensions};
use crate::features::attachments::models::{
    ensure_file_or_hyperlink, Attachment, AttachmentDetail, AttachmentFlat, FlatRow, FlatValues,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::content_types::{ContentTypeService, Owner};
use crate::features::file_types::FileTypeService;
use crate::modules::storage::FileStorage;
use crate::shared::constants::FLAT_DATE_FORMAT;

const NO_ATTACHMENT: &str = "No Attachment matches the given query.";

/// File received through a multipart upload
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

pub struct AttachmentService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
    flat: FlatStore,
    denormalizer: Arc<dyn Denormalizer>,
    filepath_prefix: Option<String>,
    safe_file: SafeFileValidator,
    max_file_size: usize,
    content_types: Arc<ContentTypeService>,
    file_types: Arc<FileTypeService>,
}

impl AttachmentService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn FileStorage>,
        extensions: &Extensions,
        config: &AttachmentConfig,
        content_types: Arc<ContentTypeService>,
        file_types: Arc<FileTypeService>,
    ) -> Result<Self> {
        Ok(Self {
            flat: FlatStore::new(pool.clone(), &extensions.flat_table)?,
            pool,
            storage,
            denormalizer: extensions.denormalizer.clone(),
            filepath_prefix: extensions.filepath_prefix.clone(),
            safe_file: SafeFileValidator::new(config),
            max_file_size: config.max_file_size,
            content_types,
            file_types,
        })
    }

    pub fn flat_store(&self) -> &FlatStore {
        &self.flat
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn list_flat(&self, params: &FlatQueryParams) -> Result<Vec<AttachmentFlatDto>> {
        let rows = self.flat.list(params).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: i64) -> Result<AttachmentResponseDto> {
        let attachment = Attachment::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;

        self.to_response(attachment).await
    }

    /// Where the file view should redirect to: the storage URL of the file,
    /// or the hyperlink
    pub async fn content_url(&self, id: i64) -> Result<String> {
        let attachment = Attachment::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;

        if !attachment.has_file() && !attachment.has_hyperlink() {
            return Err(AppError::NotFound(
                "Attachment has no file or hyperlink".to_string(),
            ));
        }

        self.url(&attachment).await
    }

    /// Storage URL of the file when present, else the hyperlink
    pub async fn url(&self, attachment: &Attachment) -> Result<String> {
        match attachment.file.as_deref().filter(|f| !f.is_empty()) {
            Some(key) => self.storage.url(key).await,
            None => Ok(attachment.hyperlink.clone()),
        }
    }

    pub async fn list_for_owner(
        &self,
        owner: &Owner,
        code: Option<&str>,
    ) -> Result<Vec<OwnerAttachmentDto>> {
        let details = self.owner_attachments(owner, code).await?;

        let mut summaries = Vec::with_capacity(details.len());
        for detail in details {
            summaries.push(OwnerAttachmentDto {
                url: self.url(&detail.attachment).await?,
                filename: detail.attachment.filename(),
                created: detail.attachment.created.format(FLAT_DATE_FORMAT).to_string(),
                file_type_display: detail.file_type_label,
            });
        }

        Ok(summaries)
    }

    /// File link of the most recent attachment of an owner under `code`
    pub async fn latest_file_link(&self, owner: &Owner, code: &str) -> Result<Option<String>> {
        let details = self.owner_attachments(owner, Some(code)).await?;
        Ok(details.last().map(|d| d.attachment.file_link()))
    }

    async fn owner_attachments(
        &self,
        owner: &Owner,
        code: Option<&str>,
    ) -> Result<Vec<AttachmentDetail>> {
        let sql = AttachmentDetail::select_sql(
            "WHERE a.content_type_id = $1 AND a.object_id = $2 \
             AND ($3::TEXT IS NULL OR a.code = $3) ORDER BY a.id",
        );

        Ok(sqlx::query_as::<_, AttachmentDetail>(&sql)
            .bind(owner.content_type.id)
            .bind(owner.object_id)
            .bind(code)
            .fetch_all(&self.pool)
            .await?)
    }

    // =========================================================================
    // JSON create / update
    // =========================================================================

    pub async fn create(
        &self,
        user: Option<&AuthenticatedUser>,
        dto: CreateAttachmentDto,
    ) -> Result<AttachmentResponseDto> {
        let file = dto
            .file
            .as_ref()
            .map(|value| decode_base64_file(value, dto.file_name.as_deref()))
            .transpose()?;
        let hyperlink = dto.hyperlink.unwrap_or_default();
        ensure_file_or_hyperlink(file.is_some(), !hyperlink.is_empty())?;

        let key = match file {
            Some(file) => Some(self.store(None, "", None, file).await?),
            None => None,
        };

        let inserted = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (file_type_id, file, hyperlink, uploaded_by, uploaded_by_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, file_type_id, file, hyperlink, content_type_id, object_id, code,
                      uploaded_by, uploaded_by_name, created, modified
            "#,
        )
        .bind(dto.file_type)
        .bind(&key)
        .bind(&hyperlink)
        .bind(user.map(|u| u.sub.as_str()))
        .bind(user.and_then(|u| u.name.as_deref()))
        .fetch_one(&self.pool)
        .await;

        let attachment = match inserted {
            Ok(attachment) => attachment,
            Err(e) => {
                if let Some(key) = &key {
                    self.discard(key).await;
                }
                return Err(handle_db_error(e, "Attachment already exists"));
            }
        };

        info!("Created attachment {}", attachment.id);
        self.denormalize(attachment.id).await;
        self.to_response(attachment).await
    }

    /// Partial update. The file/hyperlink rule is checked against the stored
    /// values merged with the incoming ones.
    pub async fn update(&self, id: i64, dto: UpdateAttachmentDto) -> Result<AttachmentResponseDto> {
        let file = dto
            .file
            .as_ref()
            .map(|value| decode_base64_file(value, dto.file_name.as_deref()))
            .transpose()?;
        let hyperlink = dto.hyperlink.filter(|h| !h.is_empty());

        let existing = AttachmentDetail::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;

        ensure_file_or_hyperlink(
            file.is_some() || existing.attachment.has_file(),
            hyperlink.is_some() || existing.attachment.has_hyperlink(),
        )?;

        let key = match file {
            Some(file) => Some(self.store_for(&existing, file).await?),
            None => None,
        };

        let updated = sqlx::query_as::<_, Attachment>(
            r#"
            UPDATE attachments SET
                file = COALESCE($2, file),
                hyperlink = COALESCE($3, hyperlink),
                file_type_id = COALESCE($4, file_type_id),
                modified = NOW()
            WHERE id = $1
            RETURNING id, file_type_id, file, hyperlink, content_type_id, object_id, code,
                      uploaded_by, uploaded_by_name, created, modified
            "#,
        )
        .bind(id)
        .bind(&key)
        .bind(&hyperlink)
        .bind(dto.file_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Attachment already exists"))?;

        debug!("Updated attachment {}", id);
        self.denormalize(id).await;
        self.to_response(updated).await
    }

    // =========================================================================
    // Multipart uploads
    // =========================================================================

    /// Validate an upload before anything is stored
    pub fn check_upload(&self, upload: &UploadedFile) -> Result<String> {
        if upload.data.len() > self.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.max_file_size
            )));
        }

        self.safe_file
            .validate(&upload.data, upload.content_type.as_deref())
    }

    /// Store an owner-less, untyped attachment
    pub async fn upload(
        &self,
        user: Option<&AuthenticatedUser>,
        upload: UploadedFile,
    ) -> Result<AttachmentFlatDto> {
        let content_type = self.check_upload(&upload)?;
        let key = self
            .store(
                None,
                "",
                None,
                Base64File {
                    name: upload.file_name,
                    content_type,
                    data: upload.data,
                },
            )
            .await?;

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO attachments (file, uploaded_by, uploaded_by_name)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&key)
        .bind(user.map(|u| u.sub.as_str()))
        .bind(user.and_then(|u| u.name.as_deref()))
        .fetch_one(&self.pool)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                self.discard(&key).await;
                return Err(AppError::Database(e));
            }
        };

        info!("Uploaded attachment {} ({})", id, key);
        self.denormalize(id).await;
        self.flat_dto(id).await
    }

    /// Replace the file of an attachment. The caller becomes the uploader.
    pub async fn replace_upload(
        &self,
        id: i64,
        user: Option<&AuthenticatedUser>,
        upload: UploadedFile,
    ) -> Result<AttachmentFlatDto> {
        let content_type = self.check_upload(&upload)?;

        let existing = AttachmentDetail::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;

        let key = self
            .store_for(
                &existing,
                Base64File {
                    name: upload.file_name,
                    content_type,
                    data: upload.data,
                },
            )
            .await?;

        sqlx::query(
            r#"
            UPDATE attachments SET
                file = $2,
                uploaded_by = $3,
                uploaded_by_name = $4,
                modified = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&key)
        .bind(user.map(|u| u.sub.as_str()))
        .bind(user.and_then(|u| u.name.as_deref()))
        .execute(&self.pool)
        .await?;

        info!("Replaced file of attachment {} with {}", id, key);
        self.denormalize(id).await;
        self.flat_dto(id).await
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Tag an attachment with `code` (and the file type for that code) and
    /// give it to `owner`. Fails when it belongs to another object that
    /// still exists.
    pub async fn associate(
        &self,
        id: i64,
        owner: &Owner,
        code: &str,
    ) -> Result<AttachmentResponseDto> {
        let attachment = Attachment::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Attachment does not exist".to_string()))?;

        if let Some(current) = self.current_owner(&attachment).await? {
            if current.content_type.id != owner.content_type.id
                || current.object_id != owner.object_id
            {
                return Err(AppError::BadRequest(format!(
                    "Attachment is already associated: {}",
                    current
                )));
            }
        }

        let file_type = self.file_types.get_or_create_by_code(code).await?;

        let updated = sqlx::query_as::<_, Attachment>(
            r#"
            UPDATE attachments SET
                file_type_id = $2,
                code = $3,
                content_type_id = $4,
                object_id = $5,
                modified = NOW()
            WHERE id = $1
            RETURNING id, file_type_id, file, hyperlink, content_type_id, object_id, code,
                      uploaded_by, uploaded_by_name, created, modified
            "#,
        )
        .bind(id)
        .bind(file_type.id)
        .bind(code)
        .bind(owner.content_type.id)
        .bind(owner.object_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Associated attachment {} with {} as '{}'", id, owner, code);
        self.denormalize(id).await;
        self.to_response(updated).await
    }

    /// Owner the attachment points at, if that object still exists
    async fn current_owner(&self, attachment: &Attachment) -> Result<Option<Owner>> {
        let (Some(content_type_id), Some(object_id)) =
            (attachment.content_type_id, attachment.object_id)
        else {
            return Ok(None);
        };

        let Some(content_type) = self.content_types.get(content_type_id).await? else {
            return Ok(None);
        };

        if !self.content_types.object_exists(&content_type, object_id).await? {
            debug!(
                "Attachment {} points at missing {}.{} object {}",
                attachment.id, content_type.app_label, content_type.model, object_id
            );
            return Ok(None);
        }

        Ok(Some(Owner {
            content_type,
            object_id,
        }))
    }

    /// Delete an attachment, its links and flat row, then its file
    pub async fn delete(&self, id: i64) -> Result<()> {
        let file = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM attachments WHERE id = $1 RETURNING file",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;

        if let Some(key) = file.filter(|k| !k.is_empty()) {
            self.discard(&key).await;
        }

        info!("Deleted attachment {}", id);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run the configured denormalizer. Failures are logged, never returned.
    pub async fn denormalize(&self, id: i64) {
        let detail = match AttachmentDetail::find(&self.pool, id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not load attachment {} for denormalization: {}", id, e);
                return;
            }
        };

        if let Err(e) = self.denormalizer.denormalize(&self.flat, &detail).await {
            warn!("Failed to denormalize attachment {}: {}", id, e);
        }
    }

    /// Flat row of an attachment, computed on the fly when the configured
    /// denormalizer did not write one
    async fn flat_dto(&self, id: i64) -> Result<AttachmentFlatDto> {
        if let Some(row) = self.flat.get(id).await? {
            return Ok(row.into());
        }

        let detail = AttachmentDetail::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_ATTACHMENT.to_string()))?;
        let values = FlatValues::from_detail(&detail);

        Ok(FlatRow {
            file_type_id: detail.attachment.file_type_id,
            flat: AttachmentFlat {
                id: 0,
                attachment_id: values.attachment_id,
                object_link: values.object_link,
                file_type: values.file_type,
                file_link: values.file_link,
                filename: values.filename,
                uploaded_by: values.uploaded_by,
                created: values.created,
            },
        }
        .into())
    }

    async fn store_for(&self, existing: &AttachmentDetail, file: Base64File) -> Result<String> {
        let owner = existing.app_label.as_deref().zip(existing.model.as_deref());
        self.store(
            owner,
            &existing.attachment.code,
            existing.attachment.object_id,
            file,
        )
        .await
    }

    async fn store(
        &self,
        owner: Option<(&str, &str)>,
        code: &str,
        object_id: Option<i64>,
        file: Base64File,
    ) -> Result<String> {
        let path = generate_file_path(
            self.filepath_prefix.as_deref(),
            owner,
            code,
            object_id,
            &file.name,
        );
        let key = self.storage.available_key(&path).await?;

        self.storage
            .put(&key, file.data, &file.content_type)
            .await?;

        debug!("Stored {} in {} storage", key, self.storage.name());
        Ok(key)
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!("Failed to remove orphaned file {}: {}", key, e);
        }
    }

    async fn to_response(&self, attachment: Attachment) -> Result<AttachmentResponseDto> {
        let file = match attachment.file.as_deref().filter(|f| !f.is_empty()) {
            Some(key) => Some(self.storage.url(key).await?),
            None => None,
        };

        Ok(AttachmentResponseDto {
            id: attachment.id,
            file_type: attachment.file_type_id,
            file,
            filename: attachment.filename(),
            hyperlink: attachment.hyperlink,
            created: attachment.created,
            modified: attachment.modified,
            uploaded_by: attachment.uploaded_by.map(|sub| UploaderDto {
                sub,
                name: attachment.uploaded_by_name,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::file_types::dtos::FileTypeQueryParams;
    use crate::shared::test_helpers::{attachments_state, create_authors, create_user, owner};
    use serde_json::json;

    fn hyperlink_dto(link: &str) -> CreateAttachmentDto {
        CreateAttachmentDto {
            file: None,
            file_name: None,
            hyperlink: Some(link.to_string()),
            file_type: None,
        }
    }

    fn text_upload(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some("text/plain".to_string()),
            data: Bytes::from_static(b"quarterly numbers\n"),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_writes_flat_row(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool, dir.path()).attachments;
        let user = create_user(&[]);

        let created = service
            .create(Some(&user), hyperlink_dto("https://example.com/docs/guide.pdf?v=2"))
            .await
            .unwrap();
        assert_eq!(created.filename, "guide.pdf");
        assert_eq!(created.uploaded_by.unwrap().sub, "test-sub");

        let row = service.flat_store().get(created.id).await.unwrap().unwrap();
        assert_eq!(row.flat.filename, "guide.pdf");
        assert_eq!(row.flat.uploaded_by, "Test User");
        assert_eq!(row.flat.file_link, format!("/api/attachments/file/{}", created.id));
        assert_eq!(
            row.flat.created,
            created.created.format(FLAT_DATE_FORMAT).to_string()
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_stores_base64_file(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool, dir.path()).attachments;

        let created = service
            .create(
                None,
                CreateAttachmentDto {
                    file: Some(json!("data:text/plain;base64,aGVsbG8=")),
                    file_name: Some("hello.txt".to_string()),
                    hyperlink: None,
                    file_type: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            created.file.as_deref(),
            Some("http://localhost/media/files/unknown/tmp/hello.txt")
        );
        assert_eq!(
            std::fs::read(dir.path().join("files/unknown/tmp/hello.txt")).unwrap(),
            b"hello".to_vec()
        );
        assert_eq!(service.content_url(created.id).await.unwrap(), created.file.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_stores_file_and_flat_row(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool, dir.path()).attachments;

        let flat = service
            .upload(Some(&create_user(&[])), text_upload("report..v2.txt"))
            .await
            .unwrap();

        assert_eq!(flat.filename, "report..v2.txt");
        assert_eq!(flat.uploaded_by, "Test User");
        assert_eq!(flat.object_link, "");
        assert!(dir.path().join("files/unknown/tmp/report..v2.txt").is_file());
        assert!(service.flat_store().get(flat.id).await.unwrap().is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_uploads_without_file_name(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool, dir.path()).attachments;

        let first = service.upload(None, text_upload("")).await.unwrap();
        let second = service.upload(None, text_upload("")).await.unwrap();

        assert_eq!(first.filename, "unnamed");
        assert!(second.filename.starts_with("unnamed_"));
        assert!(dir.path().join("files/unknown/tmp/unnamed").is_file());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_skips_attachments_without_content(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool.clone(), dir.path()).attachments;

        let linked = service
            .create(None, hyperlink_dto("https://example.com/a.pdf"))
            .await
            .unwrap();
        let blank: i64 = sqlx::query_scalar("INSERT INTO attachments DEFAULT VALUES RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(service.flat_store().denormalize_missing().await.unwrap(), 1);
        assert!(service.flat_store().get(blank).await.unwrap().is_some());

        let listed = service.list_flat(&FlatQueryParams::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, linked.id);

        let filtered = service
            .list_flat(&FlatQueryParams {
                filename: Some("b.pdf".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_merges_with_stored_values(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool, dir.path()).attachments;

        let created = service
            .create(None, hyperlink_dto("https://example.com/a.pdf"))
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                UpdateAttachmentDto {
                    file: None,
                    file_name: None,
                    hyperlink: Some("https://example.com/b.pdf".to_string()),
                    file_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.filename, "b.pdf");
        let row = service.flat_store().get(created.id).await.unwrap().unwrap();
        assert_eq!(row.flat.filename, "b.pdf");

        // the stored hyperlink counts, so adding a file gives both
        let both = service
            .update(
                created.id,
                UpdateAttachmentDto {
                    file: Some(json!("data:text/plain;base64,aGVsbG8=")),
                    file_name: None,
                    hyperlink: None,
                    file_type: None,
                },
            )
            .await;
        assert!(matches!(both, Err(AppError::Validation(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_associate_sets_owner_and_file_type(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool.clone(), dir.path()).attachments;
        let authors = create_authors(&pool, 2).await;

        let uploaded = service.upload(None, text_upload("cv.txt")).await.unwrap();
        let associated = service
            .associate(uploaded.id, &owner(&authors, 1), "author_profile_image")
            .await
            .unwrap();

        let file_types = FileTypeService::new(pool.clone())
            .list(&FileTypeQueryParams {
                code: Some("author_profile_image".to_string()),
                group: None,
            })
            .await
            .unwrap();
        assert_eq!(file_types.len(), 1);
        assert_eq!(associated.file_type, Some(file_types[0].id));

        let row = service.flat_store().get(uploaded.id).await.unwrap().unwrap();
        assert_eq!(row.flat.object_link, "/authors/1");

        // same owner again is fine
        service
            .associate(uploaded.id, &owner(&authors, 1), "author_profile_image")
            .await
            .unwrap();

        let err = service
            .associate(uploaded.id, &owner(&authors, 2), "author_profile_image")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequest(ref msg) if msg == "Attachment is already associated: sample.author object (1)"
        ));

        let err = service
            .associate(9999, &owner(&authors, 1), "author_profile_image")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Attachment does not exist"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_associate_replaces_deleted_owner(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool.clone(), dir.path()).attachments;
        let authors = create_authors(&pool, 2).await;

        let uploaded = service.upload(None, text_upload("cv.txt")).await.unwrap();
        service
            .associate(uploaded.id, &owner(&authors, 1), "cv")
            .await
            .unwrap();

        sqlx::query("DELETE FROM authors WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        service
            .associate(uploaded.id, &owner(&authors, 2), "cv")
            .await
            .unwrap();
        let attachment = Attachment::find(&pool, uploaded.id).await.unwrap().unwrap();
        assert_eq!(attachment.object_id, Some(2));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_owner_listing_and_latest_link(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let service = attachments_state(pool.clone(), dir.path()).attachments;
        let authors = create_authors(&pool, 1).await;
        let author = owner(&authors, 1);

        let mut ids = Vec::new();
        for name in ["first.txt", "second.txt"] {
            let uploaded = service.upload(None, text_upload(name)).await.unwrap();
            service.associate(uploaded.id, &author, "cv").await.unwrap();
            ids.push(uploaded.id);
        }

        let listed = service.list_for_owner(&author, Some("cv")).await.unwrap();
        let names: Vec<_> = listed.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, ["first.txt", "second.txt"]);
        // files keep the key they were uploaded under
        assert_eq!(listed[0].url, "http://localhost/media/files/unknown/tmp/first.txt");

        assert_eq!(
            service.latest_file_link(&author, "cv").await.unwrap(),
            Some(format!("/api/attachments/file/{}", ids[1]))
        );
        assert_eq!(service.latest_file_link(&author, "other").await.unwrap(), None);
    }
}
