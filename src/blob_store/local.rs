//! # Local Filesystem Backend
//!
//! Uploads go to a hidden temp file next to the target and are renamed into
//! place, so readers see either the old archive or the complete new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::errors::{BlobError, BlobResult};
use super::{validate_key, BlobStore};

/// Local filesystem blob store
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalBlobStore {
    /// Create a new local backend
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            public_base_url: None,
        }
    }

    /// Advertise objects at `{base_url}/{key}`, e.g. when the root directory
    /// is also served by a static file server
    pub fn with_public_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn full_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn map_io(key: &str, e: std::io::Error) -> BlobError {
    if e.kind() == ErrorKind::NotFound {
        BlobError::ObjectNotFound(key.to_string())
    } else {
        BlobError::IoError(e.to_string())
    }
}

/// Temp file for an in-flight upload; removed on drop unless committed
struct StagedUpload {
    tmp: PathBuf,
    committed: bool,
}

impl StagedUpload {
    fn commit(mut self, target: &Path) -> BlobResult<()> {
        std::fs::rename(&self.tmp, target).map_err(|e| BlobError::IoError(e.to_string()))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.tmp);
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, key: &str, data: &[u8]) -> BlobResult<()> {
        let full_path = self.full_path(key)?;

        // Create parent directories
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::IoError(e.to_string()))?;
        }

        let file_name = full_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BlobError::InvalidKey(key.to_string()))?;
        let staged = StagedUpload {
            tmp: full_path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4())),
            committed: false,
        };

        fs::write(&staged.tmp, data)
            .await
            .map_err(|e| BlobError::IoError(e.to_string()))?;
        staged.commit(&full_path)
    }

    async fn download(&self, key: &str) -> BlobResult<Vec<u8>> {
        let full_path = self.full_path(key)?;
        fs::read(&full_path).await.map_err(|e| map_io(key, e))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let full_path = self.full_path(key)?;
        fs::remove_file(&full_path).await.map_err(|e| map_io(key, e))
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        let full_path = self.full_path(key)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| BlobError::IoError(e.to_string()))
    }

    fn direct_url(&self, key: &str) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, key))
    }
}
