//! # Blob Store
//!
//! Path-keyed storage for artifact archives. Keys are opaque, path-like
//! strings (`acme/net/aws/1.0.0.zip`); the store does no versioning or
//! locking of its own.

pub mod bounded;
pub mod errors;
pub mod local;
pub mod memory;

use async_trait::async_trait;

pub use bounded::Bounded;
pub use errors::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;

/// Backend trait for artifact bytes
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Write data at key, replacing any previous object
    async fn upload(&self, key: &str, data: &[u8]) -> BlobResult<()>;

    /// Read the object at key
    async fn download(&self, key: &str) -> BlobResult<Vec<u8>>;

    /// Delete the object at key
    async fn delete(&self, key: &str) -> BlobResult<()>;

    /// Check if an object exists at key
    async fn exists(&self, key: &str) -> BlobResult<bool>;

    /// URL a client can fetch the object from without going through this
    /// service, when the backend supports it
    fn direct_url(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Reject keys that are empty, absolute, or step outside the store root
pub fn validate_key(key: &str) -> BlobResult<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        Err(BlobError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
