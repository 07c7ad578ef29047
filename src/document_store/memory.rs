//! # In-Memory Document Store
//!
//! Used by tests and by `document_store = "memory"` deployments. The
//! [`Collections`] table is shared with the file-backed store, which layers
//! persistence on top of the same semantics.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{DocumentError, DocumentResult};
use super::filter::Filter;
use super::{DocumentStore, UNIQUE_KEY};

/// Collection name -> records
#[derive(Debug, Default, Clone)]
pub(crate) struct Collections {
    data: HashMap<String, Vec<Value>>,
}

impl Collections {
    pub(crate) fn from_map(data: HashMap<String, Vec<Value>>) -> Self {
        Self { data }
    }

    pub(crate) fn records(&self, collection: &str) -> &[Value] {
        self.data.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn find(&self, collection: &str, filter: &Filter) -> Vec<Value> {
        self.records(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect()
    }

    pub(crate) fn find_one(&self, collection: &str, filter: &Filter) -> Option<Value> {
        self.records(collection)
            .iter()
            .find(|doc| filter.matches(doc))
            .cloned()
    }

    pub(crate) fn count(&self, collection: &str, filter: &Filter) -> u64 {
        self.records(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .count() as u64
    }

    /// Insert enforcing the unique index. Returns the record's key.
    pub(crate) fn insert(&mut self, collection: &str, record: Value) -> DocumentResult<String> {
        let key = unique_key(collection, &record)?;

        let records = self.data.entry(collection.to_string()).or_default();
        if records
            .iter()
            .any(|doc| doc.get(UNIQUE_KEY).and_then(Value::as_str) == Some(key.as_str()))
        {
            return Err(DocumentError::DuplicateKey {
                collection: collection.to_string(),
                key,
            });
        }

        records.push(record);
        Ok(key)
    }

    /// Remove and return the first record matching `filter`
    pub(crate) fn remove_one(&mut self, collection: &str, filter: &Filter) -> Option<Value> {
        let records = self.data.get_mut(collection)?;
        let pos = records.iter().position(|doc| filter.matches(doc))?;
        Some(records.remove(pos))
    }

    /// Copy of a single collection, to be mutated and later adopted
    pub(crate) fn staged(&self, collection: &str) -> Self {
        let mut data = HashMap::new();
        data.insert(collection.to_string(), self.records(collection).to_vec());
        Self { data }
    }

    /// Replace `collection` with its contents in `staged`
    pub(crate) fn adopt(&mut self, collection: &str, mut staged: Self) {
        let records = staged.data.remove(collection).unwrap_or_default();
        self.data.insert(collection.to_string(), records);
    }
}

fn unique_key(collection: &str, record: &Value) -> DocumentResult<String> {
    if !record.is_object() {
        return Err(DocumentError::InvalidRecord {
            collection: collection.to_string(),
            reason: "record must be a JSON object".to_string(),
        });
    }

    record
        .get(UNIQUE_KEY)
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DocumentError::InvalidRecord {
            collection: collection.to_string(),
            reason: format!("missing string field '{}'", UNIQUE_KEY),
        })
}

/// Collection names double as file names in the file-backed store
pub(crate) fn validate_collection(collection: &str) -> DocumentResult<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(DocumentError::InvalidCollection(collection.to_string()))
    }
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> DocumentResult<Vec<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DocumentError::Internal("Lock poisoned".to_string()))?;
        Ok(collections.find(collection, filter))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> DocumentResult<Option<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DocumentError::Internal("Lock poisoned".to_string()))?;
        Ok(collections.find_one(collection, filter))
    }

    async fn insert_one(&self, collection: &str, record: Value) -> DocumentResult<()> {
        validate_collection(collection)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DocumentError::Internal("Lock poisoned".to_string()))?;
        collections.insert(collection, record).map(|_| ())
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DocumentError::Internal("Lock poisoned".to_string()))?;
        Ok(collections.remove_one(collection, filter).map_or(0, |_| 1))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> DocumentResult<u64> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DocumentError::Internal("Lock poisoned".to_string()))?;
        Ok(collections.count(collection, filter))
    }
}
