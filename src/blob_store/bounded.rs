//! # Bounded Blob Store
//!
//! Same contract as the document store decorator: each call gets a fixed
//! time budget and fails with [`BlobError::Timeout`] when it runs over.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::{BlobError, BlobResult};
use super::BlobStore;

#[derive(Debug)]
pub struct Bounded<S> {
    inner: S,
    limit: Duration,
}

impl<S> Bounded<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn run<T>(&self, fut: impl Future<Output = BlobResult<T>>) -> BlobResult<T> {
        tokio::time::timeout(self.limit, fut)
            .await
            .map_err(|_| BlobError::Timeout(self.limit.as_secs()))?
    }
}

#[async_trait]
impl<S: BlobStore> BlobStore for Bounded<S> {
    async fn upload(&self, key: &str, data: &[u8]) -> BlobResult<()> {
        self.run(self.inner.upload(key, data)).await
    }

    async fn download(&self, key: &str) -> BlobResult<Vec<u8>> {
        self.run(self.inner.download(key)).await
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.run(self.inner.delete(key)).await
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        self.run(self.inner.exists(key)).await
    }

    fn direct_url(&self, key: &str) -> Option<String> {
        self.inner.direct_url(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::InMemoryBlobStore;

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl BlobStore for Stalled {
        async fn upload(&self, _: &str, _: &[u8]) -> BlobResult<()> {
            std::future::pending().await
        }
        async fn download(&self, _: &str) -> BlobResult<Vec<u8>> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> BlobResult<()> {
            std::future::pending().await
        }
        async fn exists(&self, _: &str) -> BlobResult<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_upload_times_out() {
        let store = Bounded::new(Stalled, Duration::from_secs(3));
        let result = store.upload("a.zip", b"data").await;
        assert!(matches!(result, Err(BlobError::Timeout(3))));
    }

    #[tokio::test]
    async fn test_passes_through() {
        let store = Bounded::new(InMemoryBlobStore::new(), Duration::from_secs(3));
        store.upload("a.zip", b"data").await.unwrap();
        assert!(store.exists("a.zip").await.unwrap());
        assert_eq!(store.direct_url("a.zip"), None);
    }
}
