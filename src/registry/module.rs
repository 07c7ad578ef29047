//! # Module Resolver
//!
//! Modules are scoped to a namespace. Every operation takes the already
//! resolved parent, so a module can only be created under a namespace
//! that was found first.

use tracing::{debug, info};

use super::catalog::Catalog;
use super::errors::{RegistryError, RegistryResult};
use super::model::{module_id, Level, Module, Namespace};
use super::names;
use crate::document_store::Filter;

#[derive(Debug, Clone)]
pub struct ModuleResolver {
    catalog: Catalog,
}

impl ModuleResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn in_namespace(namespace: &Namespace) -> Filter {
        Filter::new().eq("namespace", namespace.name.as_str())
    }

    fn by_name(namespace: &Namespace, name: &str) -> Filter {
        Self::in_namespace(namespace).eq("name", name)
    }

    pub async fn exists(&self, namespace: &Namespace, name: &str) -> RegistryResult<bool> {
        self.catalog
            .exists::<Module>(&Self::by_name(namespace, name))
            .await
    }

    /// Create a module under `namespace`
    pub async fn create(&self, namespace: &Namespace, name: &str) -> RegistryResult<Module> {
        names::validate(Level::Module, name)?;

        if self.exists(namespace, name).await? {
            return Err(RegistryError::ModuleAlreadyExists(module_id(
                &namespace.name,
                name,
            )));
        }

        let module = Module::new(namespace, name);
        self.catalog.insert(&module).await?;

        info!(module = %module.id, "module created");
        Ok(module)
    }

    pub async fn get_by_name(&self, namespace: &Namespace, name: &str) -> RegistryResult<Module> {
        self.catalog
            .find_one(&Self::by_name(namespace, name))
            .await?
            .ok_or_else(|| RegistryError::ModuleNotFound(module_id(&namespace.name, name)))
    }

    pub async fn list(&self, namespace: &Namespace) -> RegistryResult<Vec<Module>> {
        self.catalog.find(&Self::in_namespace(namespace)).await
    }

    pub async fn delete(&self, module: &Module) -> RegistryResult<()> {
        self.catalog.delete(module).await?;
        debug!(module = %module.id, "module deleted");
        Ok(())
    }

    /// Whether any module exists in `namespace`
    pub async fn has_children(&self, namespace: &Namespace) -> RegistryResult<bool> {
        self.catalog
            .exists::<Module>(&Self::in_namespace(namespace))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;
    use std::sync::Arc;

    fn resolver() -> ModuleResolver {
        ModuleResolver::new(Catalog::new(Arc::new(InMemoryDocumentStore::new())))
    }

    #[tokio::test]
    async fn test_scoped_to_namespace() {
        let resolver = resolver();
        let acme = Namespace::new("acme", "alice");
        let other = Namespace::new("other", "bob");

        let created = resolver.create(&acme, "net").await.unwrap();
        assert_eq!(created.id, "acme/net");
        assert_eq!(resolver.get_by_name(&acme, "net").await.unwrap(), created);

        assert!(!resolver.exists(&other, "net").await.unwrap());
        resolver.create(&other, "net").await.unwrap();
        assert_eq!(resolver.list(&acme).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create() {
        let resolver = resolver();
        let acme = Namespace::new("acme", "alice");
        resolver.create(&acme, "net").await.unwrap();

        let err = resolver.create(&acme, "net").await.unwrap_err();
        assert!(matches!(err, RegistryError::ModuleAlreadyExists(ref id) if id == "acme/net"));
        assert_eq!(resolver.list(&acme).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_has_children() {
        let resolver = resolver();
        let acme = Namespace::new("acme", "alice");
        assert!(!resolver.has_children(&acme).await.unwrap());

        let module = resolver.create(&acme, "net").await.unwrap();
        assert!(resolver.has_children(&acme).await.unwrap());

        resolver.delete(&module).await.unwrap();
        assert!(!resolver.has_children(&acme).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_module() {
        let resolver = resolver();
        let acme = Namespace::new("acme", "alice");
        let err = resolver.get_by_name(&acme, "net").await.unwrap_err();
        assert!(matches!(err, RegistryError::ModuleNotFound(_)));
    }
}
