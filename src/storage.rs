//! Product image storage.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Backing store for image bytes. Paths are opaque relative keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Writes `bytes` at `path` and returns the stored path.
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String, ServiceError>;

    /// Removes the object. `Ok(false)` when nothing was stored at `path`.
    async fn delete(&self, path: &str) -> Result<bool, ServiceError>;

    /// Public URL for a stored path.
    fn url_for(&self, path: &str) -> String;
}

/// Storage key for a new image of `product_id`.
pub fn image_key(product_id: Uuid, file_name: &str) -> String {
    format!(
        "products/{}/{}-{}",
        product_id,
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Files under a local directory, served by the HTTP layer at
/// `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ServiceError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ServiceError::StorageError(format!(
                "refusing storage path '{}'",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String, ServiceError> {
        let target = self.resolve(path)?;
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                ServiceError::StorageError(format!("create {}: {}", dir.display(), e))
            })?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| ServiceError::StorageError(format!("write {}: {}", path, e)))?;
        debug!(path, "stored image");
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<bool, ServiceError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServiceError::StorageError(format!(
                "delete {}: {}",
                path, e
            ))),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }
}
