//! # Namespace Resolver

use tracing::{debug, info};

use super::catalog::Catalog;
use super::errors::{RegistryError, RegistryResult};
use super::model::{Level, Namespace};
use super::names;
use crate::document_store::Filter;

/// Owns namespace identity and existence checks
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    catalog: Catalog,
}

impl NamespaceResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn by_name(name: &str) -> Filter {
        Filter::new().eq("name", name)
    }

    pub async fn exists(&self, name: &str) -> RegistryResult<bool> {
        self.catalog.exists::<Namespace>(&Self::by_name(name)).await
    }

    /// Create a namespace
    pub async fn create(&self, name: &str, owner: &str) -> RegistryResult<Namespace> {
        names::validate(Level::Namespace, name)?;
        names::validate_owner(owner)?;

        if self.exists(name).await? {
            return Err(RegistryError::NamespaceAlreadyExists(name.to_string()));
        }

        let namespace = Namespace::new(name, owner);
        self.catalog.insert(&namespace).await?;

        info!(namespace = %namespace.id, owner, "namespace created");
        Ok(namespace)
    }

    pub async fn get_by_name(&self, name: &str) -> RegistryResult<Namespace> {
        self.catalog
            .find_one(&Self::by_name(name))
            .await?
            .ok_or_else(|| RegistryError::NamespaceNotFound(name.to_string()))
    }

    pub async fn list(&self) -> RegistryResult<Vec<Namespace>> {
        self.catalog.find(&Filter::new()).await
    }

    /// Delete a namespace. Callers check for modules first.
    pub async fn delete(&self, namespace: &Namespace) -> RegistryResult<()> {
        self.catalog.delete(namespace).await?;
        debug!(namespace = %namespace.id, "namespace deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;
    use std::sync::Arc;

    fn resolver() -> NamespaceResolver {
        NamespaceResolver::new(Catalog::new(Arc::new(InMemoryDocumentStore::new())))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let resolver = resolver();
        let created = resolver.create("acme", "alice").await.unwrap();

        let fetched = resolver.get_by_name("acme").await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.owner, "alice");
        assert!(resolver.exists("acme").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create() {
        let resolver = resolver();
        resolver.create("acme", "alice").await.unwrap();

        let result = resolver.create("acme", "bob").await;
        assert!(matches!(result, Err(RegistryError::NamespaceAlreadyExists(_))));
        assert_eq!(resolver.list().await.unwrap().len(), 1);
        assert_eq!(resolver.get_by_name("acme").await.unwrap().owner, "alice");
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let resolver = resolver();
        resolver.create("acme", "alice").await.unwrap();

        assert!(!resolver.exists("ACME").await.unwrap());
        assert!(resolver.get_by_name("ACME").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_empty() {
        assert!(resolver().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let resolver = resolver();
        assert!(matches!(
            resolver.create("a/b", "alice").await,
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(matches!(
            resolver.create("acme", "").await,
            Err(RegistryError::InvalidOwner(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let resolver = resolver();
        let ns = resolver.create("acme", "alice").await.unwrap();

        resolver.delete(&ns).await.unwrap();
        assert!(!resolver.exists("acme").await.unwrap());
        assert!(resolver.delete(&ns).await.unwrap_err().is_not_found());
    }
}
