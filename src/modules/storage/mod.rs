//! Storage module for attachment files
//!
//! `FileStorage` abstracts over the MinIO/S3 client and the local filesystem
//! backend. Keys are `/`-separated relative paths produced by file path
//! generation.

mod local;
mod minio_client;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::core::config::{StorageBackend, StorageConfig};
use crate::core::error::AppError;

pub use local::LocalStorage;
pub use minio_client::MinIOClient;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `data` under `key`, overwriting any existing object
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), AppError>;

    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// URL clients use to fetch the object. May be relative for local storage.
    async fn url(&self, key: &str) -> Result<String, AppError>;

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Return `key` if it is free, otherwise `key` with a random suffix
    /// inserted before the extension.
    async fn available_key(&self, key: &str) -> Result<String, AppError> {
        let mut candidate = key.to_string();
        while self.exists(&candidate).await? {
            candidate = with_random_suffix(key);
        }
        Ok(candidate)
    }
}

/// `dir/report.pdf` -> `dir/report_1a2b3c4.pdf`
fn with_random_suffix(key: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
    let (dir, file) = match key.rfind('/') {
        Some(idx) => (&key[..=idx], &key[idx + 1..]),
        None => ("", key),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}_{}{}", dir, &file[..dot], suffix, &file[dot..]),
        _ => format!("{}{}_{}", dir, file, suffix),
    }
}

/// Build the storage backend selected by `STORAGE_BACKEND`
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn FileStorage>, AppError> {
    match config.backend {
        StorageBackend::MinIO => Ok(Arc::new(MinIOClient::new(config.minio.clone()).await?)),
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(
            &config.local.root,
            config.local.base_url.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_suffix_keeps_extension_and_dir() {
        let key = with_random_suffix("files/shop/order/1/report.pdf");
        assert!(key.starts_with("files/shop/order/1/report_"));
        assert!(key.ends_with(".pdf"));
        assert_eq!(key.len(), "files/shop/order/1/report.pdf".len() + 8);
    }

    #[test]
    fn test_random_suffix_without_extension() {
        let key = with_random_suffix("README");
        assert!(key.starts_with("README_"));
        assert_eq!(key.len(), "README".len() + 8);

        let hidden = with_random_suffix("dir/.env");
        assert!(hidden.starts_with("dir/.env_"));
    }
}
