//! Filesystem-backed [`BlobStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::blob::BlobStore;
use crate::error::{MediaError, Result};

/// Reject separators and traversal sequences that would let a blob path
/// escape the base directory.
fn validate_relative(path: &str) -> std::result::Result<(), String> {
    if path.is_empty() {
        return Err("empty blob path".to_string());
    }
    if path.starts_with('/') || path.contains('\\') || path.contains("..") {
        return Err("path traversal detected".to_string());
    }
    Ok(())
}

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl FsBlobStore {
    /// Create the store, making the base directory if needed.
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            MediaError::UploadFailed {
                path: base_path.display().to_string(),
                reason: format!("failed to create blob directory: {e}"),
            }
        })?;

        info!(path = %base_path.display(), "blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn target(&self, path: &str) -> std::result::Result<PathBuf, String> {
        validate_relative(path)?;
        Ok(self.base_path.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        if data.is_empty() {
            return Err(MediaError::UploadFailed {
                path: path.to_string(),
                reason: "empty blob".to_string(),
            });
        }
        if data.len() > self.max_size {
            return Err(MediaError::UploadFailed {
                path: path.to_string(),
                reason: format!("blob of {} bytes exceeds limit {}", data.len(), self.max_size),
            });
        }

        let target = self.target(path).map_err(|reason| MediaError::UploadFailed {
            path: path.to_string(),
            reason,
        })?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::UploadFailed {
                    path: path.to_string(),
                    reason: format!("failed to create parent directory: {e}"),
                })?;
        }

        fs::write(&target, &data)
            .await
            .map_err(|e| MediaError::UploadFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        debug!(path, size = data.len(), "stored blob");
        Ok(())
    }

    async fn resolve_url(&self, path: &str) -> Result<String> {
        let target = self
            .target(path)
            .map_err(|reason| MediaError::DownloadUrlFailed {
                path: path.to_string(),
                reason,
            })?;

        let canonical = fs::canonicalize(&target)
            .await
            .map_err(|_| MediaError::DownloadUrlFailed {
                path: path.to_string(),
                reason: "no blob stored at this path".to_string(),
            })?;

        Ok(format!("file://{}", canonical.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FsBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_then_resolve() {
        let (store, _dir) = test_store().await;
        store
            .put("images/a_profile_picture.png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        let url = store
            .resolve_url("images/a_profile_picture.png")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));

        let on_disk = std::fs::read(url.trim_start_matches("file://")).unwrap();
        assert_eq!(on_disk, b"png");
    }

    #[tokio::test]
    async fn missing_blob_has_no_url() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.resolve_url("images/missing.png").await,
            Err(MediaError::DownloadUrlFailed { .. })
        ));
    }

    #[tokio::test]
    async fn empty_blob_rejected() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.put("images/empty.png", Bytes::new()).await,
            Err(MediaError::UploadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn oversized_blob_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf(), 4).await.unwrap();
        assert!(matches!(
            store.put("images/big.png", Bytes::from_static(b"12345")).await,
            Err(MediaError::UploadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn traversal_rejected() {
        let (store, _dir) = test_store().await;
        for path in ["../escape.png", "/etc/passwd", "images/../../x"] {
            assert!(
                store.put(path, Bytes::from_static(b"x")).await.is_err(),
                "{path} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn put_replaces_previous_payload() {
        let (store, _dir) = test_store().await;
        store
            .put("images/p.png", Bytes::from_static(b"one"))
            .await
            .unwrap();
        store
            .put("images/p.png", Bytes::from_static(b"two"))
            .await
            .unwrap();

        let url = store.resolve_url("images/p.png").await.unwrap();
        let on_disk = std::fs::read(url.trim_start_matches("file://")).unwrap();
        assert_eq!(on_disk, b"two");
    }
}
