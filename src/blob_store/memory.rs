//! # In-Memory Blob Store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::errors::{BlobError, BlobResult};
use super::{validate_key, BlobStore};

/// Blob store kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, key: &str, data: &[u8]) -> BlobResult<()> {
        validate_key(key)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn download(&self, key: &str) -> BlobResult<Vec<u8>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::ObjectNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::ObjectNotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        let objects = self
            .objects
            .read()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        Ok(objects.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_delete() {
        let store = InMemoryBlobStore::new();
        assert!(store.is_empty());

        store.upload("a/b.zip", b"zip").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.download("a/b.zip").await.unwrap(), b"zip");

        store.delete("a/b.zip").await.unwrap();
        assert!(matches!(
            store.download("a/b.zip").await,
            Err(BlobError::ObjectNotFound(_))
        ));
        assert!(store.delete("a/b.zip").await.unwrap_err().is_not_found());
    }
}
