//! # Registry Facade
//!
//! Fully-qualified lookups over the four resolvers. Each lookup resolves
//! left to right and stops at the first missing level, so the error always
//! names the outermost level that is absent. The facade also owns the
//! delete guards: a parent cannot be removed while children exist. Child
//! creation holds the parent coordinate shared and parent deletion holds it
//! exclusively, so the guard check and the delete are atomic with respect
//! to inserts under that parent.

use std::sync::Arc;

use tracing::info;

use super::catalog::Catalog;
use super::download::{DownloadLocator, DownloadMode, DownloadSigner, SignedLink};
use super::errors::{RegistryError, RegistryResult};
use super::locks::CoordinateLocks;
use super::model::{module_id, system_id, Level, Module, Namespace, System, Version};
use super::module::ModuleResolver;
use super::namespace::NamespaceResolver;
use super::system::SystemResolver;
use super::version::VersionManager;
use crate::blob_store::{BlobStore, InMemoryBlobStore};
use crate::document_store::{DocumentStore, InMemoryDocumentStore};

/// Download settings for a registry
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub download_mode: DownloadMode,
    pub signer: DownloadSigner,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            download_mode: DownloadMode::default(),
            signer: DownloadSigner::random(3600),
        }
    }
}

/// Entry point for every registry operation
#[derive(Debug, Clone)]
pub struct Registry {
    namespaces: NamespaceResolver,
    modules: ModuleResolver,
    systems: SystemResolver,
    versions: VersionManager,
    locks: Arc<CoordinateLocks>,
}

impl Registry {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        options: RegistryOptions,
    ) -> Self {
        let catalog = Catalog::new(documents);
        let versions = VersionManager::new(
            catalog.clone(),
            blobs,
            options.download_mode,
            options.signer,
        );
        Self {
            namespaces: NamespaceResolver::new(catalog.clone()),
            modules: ModuleResolver::new(catalog.clone()),
            systems: SystemResolver::new(catalog),
            locks: versions.locks().clone(),
            versions,
        }
    }

    /// Registry backed entirely by memory
    pub fn in_memory(options: RegistryOptions) -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryBlobStore::new()),
            options,
        )
    }

    pub fn download_mode(&self) -> DownloadMode {
        self.versions.mode()
    }

    // ==================
    // Namespaces
    // ==================

    pub async fn resolve_namespace(&self, namespace: &str) -> RegistryResult<Namespace> {
        self.namespaces.get_by_name(namespace).await
    }

    pub async fn create_namespace(&self, name: &str, owner: &str) -> RegistryResult<Namespace> {
        self.namespaces.create(name, owner).await
    }

    pub async fn list_namespaces(&self) -> RegistryResult<Vec<Namespace>> {
        self.namespaces.list().await
    }

    pub async fn delete_namespace(&self, namespace: &str) -> RegistryResult<()> {
        let _guard = self.locks.acquire(namespace).await;
        let ns = self.resolve_namespace(namespace).await?;
        if self.modules.has_children(&ns).await? {
            return Err(has_children(Level::Namespace, &ns.id));
        }
        self.namespaces.delete(&ns).await?;
        info!(namespace = %ns.id, "namespace removed");
        Ok(())
    }

    // ==================
    // Modules
    // ==================

    pub async fn resolve_module(&self, namespace: &str, module: &str) -> RegistryResult<Module> {
        let ns = self.resolve_namespace(namespace).await?;
        self.modules.get_by_name(&ns, module).await
    }

    pub async fn create_module(&self, namespace: &str, name: &str) -> RegistryResult<Module> {
        let _parent = self.locks.acquire_shared(namespace).await;
        let ns = self.resolve_namespace(namespace).await?;
        self.modules.create(&ns, name).await
    }

    pub async fn list_modules(&self, namespace: &str) -> RegistryResult<Vec<Module>> {
        let ns = self.resolve_namespace(namespace).await?;
        self.modules.list(&ns).await
    }

    pub async fn delete_module(&self, namespace: &str, module: &str) -> RegistryResult<()> {
        let _guard = self.locks.acquire(&module_id(namespace, module)).await;
        let module = self.resolve_module(namespace, module).await?;
        if self.systems.has_children(&module).await? {
            return Err(has_children(Level::Module, &module.id));
        }
        self.modules.delete(&module).await?;
        info!(module = %module.id, "module removed");
        Ok(())
    }

    // ==================
    // Systems
    // ==================

    pub async fn resolve_system(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
    ) -> RegistryResult<System> {
        let module = self.resolve_module(namespace, module).await?;
        self.systems.get_by_name(&module, system).await
    }

    pub async fn create_system(
        &self,
        namespace: &str,
        module: &str,
        name: &str,
    ) -> RegistryResult<System> {
        let _parent = self.locks.acquire_shared(&module_id(namespace, module)).await;
        let module = self.resolve_module(namespace, module).await?;
        self.systems.create(name, &module).await
    }

    pub async fn list_systems(&self, namespace: &str, module: &str) -> RegistryResult<Vec<System>> {
        let module = self.resolve_module(namespace, module).await?;
        self.systems.list_by_module(&module).await
    }

    pub async fn delete_system(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
    ) -> RegistryResult<()> {
        let _guard = self.locks.acquire(&system_id(namespace, module, system)).await;
        let system = self.resolve_system(namespace, module, system).await?;
        if self.versions.has_children(&system).await? {
            return Err(has_children(Level::System, &system.id));
        }
        self.systems.delete(&system).await?;
        info!(system = %system.id, "system removed");
        Ok(())
    }

    // ==================
    // Versions
    // ==================

    pub async fn resolve_version(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
        version: &str,
    ) -> RegistryResult<Version> {
        let system = self.resolve_system(namespace, module, system).await?;
        self.versions.get_by_name(&system, version).await
    }

    /// Publish an archive. Every parent level must already exist.
    pub async fn create_version(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
        version: &str,
        data: &[u8],
    ) -> RegistryResult<Version> {
        let _parent = self
            .locks
            .acquire_shared(&system_id(namespace, module, system))
            .await;
        let ns = self.resolve_namespace(namespace).await?;
        let module = self.modules.get_by_name(&ns, module).await?;
        let system = self.systems.get_by_name(&module, system).await?;
        self.versions
            .create(data, &ns, &module, &system, version)
            .await
    }

    pub async fn list_versions(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
    ) -> RegistryResult<Vec<Version>> {
        let system = self.resolve_system(namespace, module, system).await?;
        self.versions.list_by_system(&system).await
    }

    pub async fn delete_version(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
        version: &str,
    ) -> RegistryResult<()> {
        let version = self
            .resolve_version(namespace, module, system, version)
            .await?;
        self.versions.delete(&version).await
    }

    // ==================
    // Downloads
    // ==================

    /// Resolve a version and the location its archive is served from
    pub async fn resolve_download(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
        version: &str,
    ) -> RegistryResult<(Version, DownloadLocator)> {
        let version = self
            .resolve_version(namespace, module, system, version)
            .await?;
        let locator = self.versions.download_location(&version);
        Ok((version, locator))
    }

    /// Read a version's archive. A link is checked whenever one is given
    /// and is mandatory in redirect mode.
    pub async fn fetch_artifact(
        &self,
        namespace: &str,
        module: &str,
        system: &str,
        version: &str,
        link: Option<&SignedLink>,
    ) -> RegistryResult<Vec<u8>> {
        let version = self
            .resolve_version(namespace, module, system, version)
            .await?;

        match link {
            Some(link) => self.versions.verify_link(&version, link)?,
            None if self.download_mode() == DownloadMode::Redirect => {
                return Err(RegistryError::InvalidDownloadLink)
            }
            None => {}
        }

        self.versions.fetch(&version).await
    }

    pub fn download_count(&self, version: &Version) -> u64 {
        self.versions.download_count(version)
    }
}

fn has_children(level: Level, id: &str) -> RegistryError {
    RegistryError::HasChildren {
        level,
        id: id.to_string(),
        children: level.child().unwrap_or(level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::in_memory(RegistryOptions::default())
    }

    async fn seeded() -> Registry {
        let registry = registry();
        registry.create_namespace("acme", "alice").await.unwrap();
        registry.create_module("acme", "net").await.unwrap();
        registry.create_system("acme", "net", "aws").await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_short_circuit_order() {
        let registry = registry();
        assert!(matches!(
            registry.resolve_version("acme", "net", "aws", "1.0.0").await,
            Err(RegistryError::NamespaceNotFound(_))
        ));

        registry.create_namespace("acme", "alice").await.unwrap();
        assert!(matches!(
            registry.resolve_version("acme", "net", "aws", "1.0.0").await,
            Err(RegistryError::ModuleNotFound(_))
        ));

        registry.create_module("acme", "net").await.unwrap();
        assert!(matches!(
            registry.resolve_version("acme", "net", "aws", "1.0.0").await,
            Err(RegistryError::SystemNotFound(_))
        ));

        registry.create_system("acme", "net", "aws").await.unwrap();
        assert!(matches!(
            registry.resolve_version("acme", "net", "aws", "1.0.0").await,
            Err(RegistryError::VersionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_parent() {
        let registry = registry();
        assert!(matches!(
            registry.create_module("acme", "net").await,
            Err(RegistryError::NamespaceNotFound(_))
        ));
        assert!(matches!(
            registry.create_version("acme", "net", "aws", "1.0.0", b"x").await,
            Err(RegistryError::NamespaceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let registry = seeded().await;
        registry
            .create_version("acme", "net", "aws", "1.0.0", b"zip")
            .await
            .unwrap();

        let err = registry.delete_namespace("acme").await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::HasChildren { level: Level::Namespace, children: Level::Module, .. }
        ));
        assert!(matches!(
            registry.delete_module("acme", "net").await,
            Err(RegistryError::HasChildren { level: Level::Module, .. })
        ));
        assert!(matches!(
            registry.delete_system("acme", "net", "aws").await,
            Err(RegistryError::HasChildren { level: Level::System, .. })
        ));

        registry
            .delete_version("acme", "net", "aws", "1.0.0")
            .await
            .unwrap();
        registry.delete_system("acme", "net", "aws").await.unwrap();
        registry.delete_module("acme", "net").await.unwrap();
        registry.delete_namespace("acme").await.unwrap();
        assert!(registry.list_namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_requires_link_in_redirect_mode() {
        let registry = seeded().await;
        registry
            .create_version("acme", "net", "aws", "1.0.0", b"zip")
            .await
            .unwrap();

        assert!(matches!(
            registry.fetch_artifact("acme", "net", "aws", "1.0.0", None).await,
            Err(RegistryError::InvalidDownloadLink)
        ));

        let bad = SignedLink::new("forged", i64::MAX);
        assert!(matches!(
            registry
                .fetch_artifact("acme", "net", "aws", "1.0.0", Some(&bad))
                .await,
            Err(RegistryError::InvalidDownloadLink)
        ));
    }

    #[tokio::test]
    async fn test_fetch_in_proxy_mode() {
        let registry = Registry::in_memory(RegistryOptions {
            download_mode: DownloadMode::Proxy,
            ..RegistryOptions::default()
        });
        registry.create_namespace("acme", "alice").await.unwrap();
        registry.create_module("acme", "net").await.unwrap();
        registry.create_system("acme", "net", "aws").await.unwrap();
        registry
            .create_version("acme", "net", "aws", "1.0.0", b"zip")
            .await
            .unwrap();

        let (_, locator) = registry
            .resolve_download("acme", "net", "aws", "1.0.0")
            .await
            .unwrap();
        assert!(matches!(locator, DownloadLocator::Proxy { .. }));

        let bytes = registry
            .fetch_artifact("acme", "net", "aws", "1.0.0", None)
            .await
            .unwrap();
        assert_eq!(bytes, b"zip");
    }
}
