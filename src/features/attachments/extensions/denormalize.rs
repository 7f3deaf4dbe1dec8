use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::attachments::models::{AttachmentDetail, FlatValues};
use crate::features::attachments::services::FlatStore;

/// Writes the flat projection of an attachment after it is saved
#[async_trait]
pub trait Denormalizer: Send + Sync {
    async fn denormalize(&self, store: &FlatStore, detail: &AttachmentDetail) -> Result<()>;
}

/// Full projection: object link, file type label, file link, filename,
/// uploader name and creation date
pub struct DefaultDenormalizer;

#[async_trait]
impl Denormalizer for DefaultDenormalizer {
    async fn denormalize(&self, store: &FlatStore, detail: &AttachmentDetail) -> Result<()> {
        store.upsert(&FlatValues::from_detail(detail)).await
    }
}

/// Only keeps the object link current
pub struct ObjectLinkDenormalizer;

#[async_trait]
impl Denormalizer for ObjectLinkDenormalizer {
    async fn denormalize(&self, store: &FlatStore, detail: &AttachmentDetail) -> Result<()> {
        let values = FlatValues::from_detail(detail);
        store
            .upsert_object_link(values.attachment_id, &values.object_link, &values.created)
            .await
    }
}

/// Denormalization switched off
pub struct NoDenormalize;

#[async_trait]
impl Denormalizer for NoDenormalize {
    async fn denormalize(&self, _store: &FlatStore, _detail: &AttachmentDetail) -> Result<()> {
        Ok(())
    }
}
