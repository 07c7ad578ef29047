//! # System Resolver

use tracing::{debug, info};

use super::catalog::Catalog;
use super::errors::{RegistryError, RegistryResult};
use super::model::{system_id, Level, Module, System};
use super::names;
use crate::document_store::Filter;

/// Owns system identity scoped to a module
#[derive(Debug, Clone)]
pub struct SystemResolver {
    catalog: Catalog,
}

impl SystemResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn in_module(module: &Module) -> Filter {
        Filter::new()
            .eq("namespace", module.namespace.as_str())
            .eq("module", module.name.as_str())
    }

    fn by_name(module: &Module, name: &str) -> Filter {
        Self::in_module(module).eq("name", name)
    }

    pub async fn exists_by_name(&self, module: &Module, name: &str) -> RegistryResult<bool> {
        self.catalog
            .exists::<System>(&Self::by_name(module, name))
            .await
    }

    pub async fn create(&self, name: &str, module: &Module) -> RegistryResult<System> {
        names::validate(Level::System, name)?;

        if self.exists_by_name(module, name).await? {
            return Err(RegistryError::SystemAlreadyExists(system_id(
                &module.namespace,
                &module.name,
                name,
            )));
        }

        let system = System::new(module, name);
        self.catalog.insert(&system).await?;

        info!(system = %system.id, "system created");
        Ok(system)
    }

    pub async fn get_by_name(&self, module: &Module, name: &str) -> RegistryResult<System> {
        self.catalog
            .find_one(&Self::by_name(module, name))
            .await?
            .ok_or_else(|| {
                RegistryError::SystemNotFound(system_id(&module.namespace, &module.name, name))
            })
    }

    pub async fn list_by_module(&self, module: &Module) -> RegistryResult<Vec<System>> {
        self.catalog.find(&Self::in_module(module)).await
    }

    pub async fn delete(&self, system: &System) -> RegistryResult<()> {
        self.catalog.delete(system).await?;
        debug!(system = %system.id, "system deleted");
        Ok(())
    }

    /// Whether any system exists under `module`
    pub async fn has_children(&self, module: &Module) -> RegistryResult<bool> {
        self.catalog.exists::<System>(&Self::in_module(module)).await
    }
}
