//! # Catalog
//!
//! Typed access to the document store for registry entities.

use std::sync::Arc;

use serde_json::Value;

use super::errors::{RegistryError, RegistryResult};
use super::model::Entity;
use crate::document_store::{DocumentStore, Filter, UNIQUE_KEY};

/// Typed wrapper over a shared document store
#[derive(Debug, Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find<T: Entity>(&self, filter: &Filter) -> RegistryResult<Vec<T>> {
        self.store
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    pub async fn find_one<T: Entity>(&self, filter: &Filter) -> RegistryResult<Option<T>> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    pub async fn count<T: Entity>(&self, filter: &Filter) -> RegistryResult<u64> {
        Ok(self.store.count(T::COLLECTION, filter).await?)
    }

    pub async fn exists<T: Entity>(&self, filter: &Filter) -> RegistryResult<bool> {
        Ok(self.count::<T>(filter).await? > 0)
    }

    /// Insert an entity. The store's unique index turns a concurrent
    /// duplicate into the level's already-exists error.
    pub async fn insert<T: Entity>(&self, entity: &T) -> RegistryResult<()> {
        let record = serde_json::to_value(entity).map_err(|e| RegistryError::PersistFailed {
            id: entity.id().to_string(),
            reason: e.to_string(),
        })?;

        self.store
            .insert_one(T::COLLECTION, record)
            .await
            .map_err(|e| RegistryError::from_insert(T::LEVEL, entity.id(), e))
    }

    /// Delete an entity by identifier
    pub async fn delete<T: Entity>(&self, entity: &T) -> RegistryResult<()> {
        let removed = self
            .store
            .delete_one(T::COLLECTION, &Filter::new().eq(UNIQUE_KEY, entity.id()))
            .await?;

        if removed == 0 {
            return Err(RegistryError::not_found(T::LEVEL, entity.id()));
        }
        Ok(())
    }
}

fn decode<T: Entity>(record: Value) -> RegistryResult<T> {
    serde_json::from_value(record).map_err(|e| {
        RegistryError::StorageUnavailable(format!("corrupt {} record: {}", T::LEVEL, e))
    })
}
