use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::FileStorage;
use crate::core::error::AppError;

/// Files kept on local disk and served under `base_url` by a reverse proxy
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    fn resolve_path(&self, key: &str) -> Result<PathBuf, AppError> {
        let escapes = Path::new(key).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if key.is_empty() || escapes || key.starts_with('\\') {
            return Err(AppError::Storage(format!("Invalid file key: {}", key)));
        }

        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    #[instrument(skip(self, data), fields(storage = "local"))]
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), AppError> {
        let path = self.resolve_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create '{}': {}", key, e)))?;
        file.write_all(&data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write '{}': {}", key, e)))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to sync '{}': {}", key, e)))?;

        debug!(path = ?path, size = data.len(), "File stored");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let path = self.resolve_path(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat '{}': {}", key, e)))
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = ?path, "File deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete '{}': {}",
                key, e
            ))),
        }
    }

    async fn url(&self, key: &str) -> Result<String, AppError> {
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn name(&self) -> &str {
        "local"
    }
}
