//! # Document Store
//!
//! Contract the registry catalog requires from its metadata database:
//! filter-based find, insert, delete and count over flat JSON records.
//!
//! Every implementation enforces a unique index on [`UNIQUE_KEY`] per
//! collection, so two concurrent inserts of the same identifier can never
//! both succeed.

pub mod bounded;
pub mod errors;
pub mod file;
pub mod filter;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub use bounded::Bounded;
pub use errors::{DocumentError, DocumentResult};
pub use file::FileDocumentStore;
pub use filter::{Filter, FilterExpr};
pub use memory::InMemoryDocumentStore;

/// Field carrying the unique identifier of every record
pub const UNIQUE_KEY: &str = "id";

/// Backend trait for catalog metadata
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// All records of `collection` matching `filter`, in no defined order
    async fn find(&self, collection: &str, filter: &Filter) -> DocumentResult<Vec<Value>>;

    /// First record matching `filter`, if any
    async fn find_one(&self, collection: &str, filter: &Filter) -> DocumentResult<Option<Value>>;

    /// Insert a record. Fails with [`DocumentError::DuplicateKey`] when a
    /// record with the same [`UNIQUE_KEY`] exists.
    async fn insert_one(&self, collection: &str, record: Value) -> DocumentResult<()>;

    /// Delete the first record matching `filter`, returning how many were removed (0 or 1)
    async fn delete_one(&self, collection: &str, filter: &Filter) -> DocumentResult<u64>;

    /// Number of records matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> DocumentResult<u64>;
}
