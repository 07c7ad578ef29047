//! # Bounded Document Store
//!
//! Decorator that gives every operation a fixed time budget. A timed-out
//! operation fails with [`DocumentError::Timeout`]; nothing is retried.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{DocumentError, DocumentResult};
use super::filter::Filter;
use super::DocumentStore;

/// Wraps a store so that each call fails after `limit`
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

    async fn run<T>(&self, fut: impl Future<Output = DocumentResult<T>>) -> DocumentResult<T> {
        tokio::time::timeout(self.limit, fut)
            .await
            .map_err(|_| DocumentError::Timeout(self.limit.as_secs()))?
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for Bounded<S> {
    async fn find(&self, collection: &str, filter: &Filter) -> DocumentResult<Vec<Value>> {
        self.run(self.inner.find(collection, filter)).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> DocumentResult<Option<Value>> {
        self.run(self.inner.find_one(collection, filter)).await
    }

    async fn insert_one(&self, collection: &str, record: Value) -> DocumentResult<()> {
        self.run(self.inner.insert_one(collection, record)).await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        self.run(self.inner.delete_one(collection, filter)).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        self.run(self.inner.count(collection, filter)).await
    }
}
