//! Configuration file
//!
//! A single JSON document. Everything except `data_dir` has a default.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::blob_store::{self, BlobStore, LocalBlobStore};
use crate::document_store::{self, DocumentStore, FileDocumentStore, InMemoryDocumentStore};
use crate::http_server::HttpServerConfig;
use crate::registry::{DownloadMode, DownloadSigner, Registry, RegistryOptions};

/// Metadata backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Archive root (default: `{data_dir}/blobs`)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Base URL clients can fetch archives from directly
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default)]
    pub mode: DownloadMode,

    /// Secret for signed download links (random per process when absent)
    #[serde(default)]
    pub signing_secret: Option<String>,

    #[serde(default = "default_link_ttl")]
    pub link_ttl_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            mode: DownloadMode::default(),
            signing_secret: None,
            link_ttl_secs: default_link_ttl(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: PathBuf,

    #[serde(default)]
    pub document_store: DocumentStoreKind,

    #[serde(default)]
    pub blob_store: BlobStoreConfig,

    /// Upper bound for a single storage operation
    #[serde(default = "default_storage_timeout")]
    pub storage_timeout_secs: u64,

    /// Largest accepted request body
    #[serde(default = "default_max_artifact")]
    pub max_artifact_bytes: usize,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_storage_timeout() -> u64 {
    10
}
fn default_max_artifact() -> usize {
    100 * 1024 * 1024
} // 100MB
fn default_link_ttl() -> u64 {
    3600
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Default configuration rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            document_store: DocumentStoreKind::default(),
            blob_store: BlobStoreConfig::default(),
            storage_timeout_secs: default_storage_timeout(),
            max_artifact_bytes: default_max_artifact(),
            http: HttpServerConfig::default(),
            download: DownloadConfig::default(),
            log_filter: default_log_filter(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        if self.storage_timeout_secs == 0 {
            return Err(CliError::config_error("storage_timeout_secs must be > 0"));
        }
        if self.max_artifact_bytes == 0 {
            return Err(CliError::config_error("max_artifact_bytes must be > 0"));
        }
        if self.download.link_ttl_secs == 0 {
            return Err(CliError::config_error("download.link_ttl_secs must be > 0"));
        }
        if matches!(&self.download.signing_secret, Some(s) if s.is_empty()) {
            return Err(CliError::config_error(
                "download.signing_secret must not be empty when set",
            ));
        }
        Ok(())
    }

    /// Directory holding the catalog collections
    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join("catalog")
    }

    pub fn blob_root(&self) -> PathBuf {
        self.blob_store
            .root
            .clone()
            .unwrap_or_else(|| self.data_dir.join("blobs"))
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }

    fn signer(&self) -> DownloadSigner {
        match &self.download.signing_secret {
            Some(secret) => DownloadSigner::new(secret.as_bytes(), self.download.link_ttl_secs),
            None => DownloadSigner::random(self.download.link_ttl_secs),
        }
    }

    /// Open the storage backends and assemble the registry
    pub async fn build_registry(&self) -> CliResult<Registry> {
        let timeout = self.storage_timeout();

        let documents: Arc<dyn DocumentStore> = match self.document_store {
            DocumentStoreKind::File => {
                let store = FileDocumentStore::open(self.catalog_dir()).await?;
                Arc::new(document_store::Bounded::new(store, timeout))
            }
            DocumentStoreKind::Memory => Arc::new(document_store::Bounded::new(
                InMemoryDocumentStore::new(),
                timeout,
            )),
        };

        let mut local = LocalBlobStore::new(self.blob_root());
        if let Some(base) = &self.blob_store.public_base_url {
            local = local.with_public_url(base.clone());
        }
        let blobs: Arc<dyn BlobStore> = Arc::new(blob_store::Bounded::new(local, timeout));

        let options = RegistryOptions {
            download_mode: self.download.mode,
            signer: self.signer(),
        };
        Ok(Registry::new(documents, blobs, options))
    }
}
