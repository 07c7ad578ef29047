//! # Version Manager
//!
//! Versions are the only level with an artifact attached. Creation runs
//! `absent -> uploading -> recorded`: the archive is written to the blob
//! store first and the metadata record is inserted only after the upload
//! succeeded. The uploading state is never persisted, so a failed create
//! leaves at most an orphan blob and never a record without bytes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::catalog::Catalog;
use super::download::{fetch_path, DownloadLocator, DownloadMode, DownloadSigner, SignedLink};
use super::errors::{RegistryError, RegistryResult};
use super::locks::CoordinateLocks;
use super::model::{version_id, Level, Module, Namespace, System, Version};
use super::names;
use crate::blob_store::{BlobError, BlobStore};
use crate::document_store::Filter;

/// Owns version identity, artifact persistence and download indirection
#[derive(Debug, Clone)]
pub struct VersionManager {
    catalog: Catalog,
    blobs: Arc<dyn BlobStore>,
    locks: Arc<CoordinateLocks>,
    mode: DownloadMode,
    signer: DownloadSigner,
}

impl VersionManager {
    pub fn new(
        catalog: Catalog,
        blobs: Arc<dyn BlobStore>,
        mode: DownloadMode,
        signer: DownloadSigner,
    ) -> Self {
        Self {
            catalog,
            blobs,
            locks: Arc::new(CoordinateLocks::new()),
            mode,
            signer,
        }
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    /// Lock table shared with the registry's parent/child guards
    pub fn locks(&self) -> &Arc<CoordinateLocks> {
        &self.locks
    }

    fn in_system(system: &System) -> Filter {
        Filter::new()
            .eq("namespace", system.namespace.as_str())
            .eq("module", system.module.as_str())
            .eq("system", system.name.as_str())
    }

    fn by_name(system: &System, name: &str) -> Filter {
        Self::in_system(system).eq("name", name)
    }

    pub async fn exists_by_name(&self, system: &System, name: &str) -> RegistryResult<bool> {
        self.catalog
            .exists::<Version>(&Self::by_name(system, name))
            .await
    }

    /// Publish `data` as version `name` of `system`
    pub async fn create(
        &self,
        data: &[u8],
        namespace: &Namespace,
        module: &Module,
        system: &System,
        name: &str,
    ) -> RegistryResult<Version> {
        names::validate(Level::Version, name)?;

        let version = Version::new(namespace, module, system, name);
        let _guard = self.locks.acquire(&version.id).await;

        if self.exists_by_name(system, name).await? {
            return Err(RegistryError::VersionAlreadyExists(version.id));
        }

        debug!(version = %version.id, key = %version.storage_key, bytes = data.len(), "uploading artifact");
        self.blobs
            .upload(&version.storage_key, data)
            .await
            .map_err(|e| match e {
                timeout @ BlobError::Timeout(_) => {
                    RegistryError::StorageUnavailable(timeout.to_string())
                }
                other => RegistryError::UploadFailed {
                    key: version.storage_key.clone(),
                    reason: other.to_string(),
                },
            })?;

        // Another process may have recorded the coordinate during the upload
        if self.exists_by_name(system, name).await? {
            return Err(RegistryError::VersionAlreadyExists(version.id));
        }
        self.catalog.insert(&version).await?;

        info!(version = %version.id, bytes = data.len(), "version published");
        Ok(version)
    }

    pub async fn get_by_name(&self, system: &System, name: &str) -> RegistryResult<Version> {
        self.catalog
            .find_one(&Self::by_name(system, name))
            .await?
            .ok_or_else(|| {
                RegistryError::VersionNotFound(version_id(
                    &system.namespace,
                    &system.module,
                    &system.name,
                    name,
                ))
            })
    }

    pub async fn list_by_system(&self, system: &System) -> RegistryResult<Vec<Version>> {
        self.catalog.find(&Self::in_system(system)).await
    }

    /// Whether any version is recorded under `system`
    pub async fn has_children(&self, system: &System) -> RegistryResult<bool> {
        self.catalog
            .exists::<Version>(&Self::in_system(system))
            .await
    }

    /// Remove the record, then the archive. Orphan archives are harmless,
    /// so a failed blob removal is only logged. The coordinate stays locked
    /// until the archive is gone, so a concurrent re-publish cannot have its
    /// fresh upload removed underneath its record.
    pub async fn delete(&self, version: &Version) -> RegistryResult<()> {
        let _guard = self.locks.acquire(&version.id).await;
        self.catalog.delete(version).await?;

        match self.blobs.delete(&version.storage_key).await {
            Ok(()) => debug!(version = %version.id, "version deleted"),
            Err(e) if e.is_not_found() => {
                debug!(version = %version.id, "version deleted; archive already gone")
            }
            Err(e) => warn!(
                version = %version.id,
                key = %version.storage_key,
                error = %e,
                "version deleted but archive removal failed"
            ),
        }
        Ok(())
    }

    /// Location a client should fetch the archive from
    pub fn download_location(&self, version: &Version) -> DownloadLocator {
        match self.mode {
            DownloadMode::Proxy => DownloadLocator::Proxy {
                storage_key: version.storage_key.clone(),
            },
            DownloadMode::Redirect => {
                let location = self
                    .blobs
                    .direct_url(&version.storage_key)
                    .unwrap_or_else(|| {
                        format!("{}?{}", fetch_path(version), self.signer.sign(version).to_query())
                    });
                DownloadLocator::Redirect { location }
            }
        }
    }

    /// Read the archive bytes
    pub async fn fetch(&self, version: &Version) -> RegistryResult<Vec<u8>> {
        self.blobs
            .download(&version.storage_key)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RegistryError::ArtifactMissing(version.storage_key.clone())
                } else {
                    e.into()
                }
            })
    }

    pub fn verify_link(&self, version: &Version, link: &SignedLink) -> RegistryResult<()> {
        self.signer.verify(version, link)
    }

    /// Downloads are not counted
    pub fn download_count(&self, _version: &Version) -> u64 {
        0
    }
}
