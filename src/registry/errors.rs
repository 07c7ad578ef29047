//! # Registry Errors
//!
//! Every storage failure reaching the registry is classified into one of
//! these kinds. None of them is fatal to the process.

use thiserror::Error;

use super::model::Level;
use crate::blob_store::BlobError;
use crate::document_store::DocumentError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    // Lookup errors
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("System not found: {0}")]
    SystemNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    // Uniqueness errors
    #[error("Namespace already exists: {0}")]
    NamespaceAlreadyExists(String),

    #[error("Module already exists: {0}")]
    ModuleAlreadyExists(String),

    #[error("System already exists: {0}")]
    SystemAlreadyExists(String),

    #[error("Version already exists: {0}")]
    VersionAlreadyExists(String),

    /// Delete rejected while dependents exist one level down
    #[error("{level} '{id}' still has {children} entries; delete them first")]
    HasChildren {
        level: Level,
        id: String,
        children: Level,
    },

    // Validation errors
    #[error("Invalid {level} name '{name}': {reason}")]
    InvalidName {
        level: Level,
        name: String,
        reason: String,
    },

    #[error("Invalid owner: {0}")]
    InvalidOwner(String),

    // Download link errors
    #[error("Download link expired")]
    DownloadLinkExpired,

    #[error("Invalid download link")]
    InvalidDownloadLink,

    // Storage errors
    #[error("Upload of {key} failed: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("Failed to record {id}: {reason}")]
    PersistFailed { id: String, reason: String },

    #[error("Artifact missing from storage: {0}")]
    ArtifactMissing(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl RegistryError {
    /// Not-found error for the given level
    pub fn not_found(level: Level, id: impl Into<String>) -> Self {
        let id = id.into();
        match level {
            Level::Namespace => RegistryError::NamespaceNotFound(id),
            Level::Module => RegistryError::ModuleNotFound(id),
            Level::System => RegistryError::SystemNotFound(id),
            Level::Version => RegistryError::VersionNotFound(id),
        }
    }

    /// Already-exists error for the given level
    pub fn already_exists(level: Level, id: impl Into<String>) -> Self {
        let id = id.into();
        match level {
            Level::Namespace => RegistryError::NamespaceAlreadyExists(id),
            Level::Module => RegistryError::ModuleAlreadyExists(id),
            Level::System => RegistryError::SystemAlreadyExists(id),
            Level::Version => RegistryError::VersionAlreadyExists(id),
        }
    }

    /// Classify a failed insert of the record `id` at `level`
    pub fn from_insert(level: Level, id: &str, err: DocumentError) -> Self {
        match err {
            DocumentError::DuplicateKey { .. } => Self::already_exists(level, id),
            timeout @ DocumentError::Timeout(_) => {
                RegistryError::StorageUnavailable(timeout.to_string())
            }
            other => RegistryError::PersistFailed {
                id: id.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NamespaceNotFound(_)
                | RegistryError::ModuleNotFound(_)
                | RegistryError::SystemNotFound(_)
                | RegistryError::VersionNotFound(_)
        )
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            RegistryError::NamespaceAlreadyExists(_)
                | RegistryError::ModuleAlreadyExists(_)
                | RegistryError::SystemAlreadyExists(_)
                | RegistryError::VersionAlreadyExists(_)
        )
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::NamespaceNotFound(_)
            | RegistryError::ModuleNotFound(_)
            | RegistryError::SystemNotFound(_)
            | RegistryError::VersionNotFound(_) => 404,
            RegistryError::NamespaceAlreadyExists(_)
            | RegistryError::ModuleAlreadyExists(_)
            | RegistryError::SystemAlreadyExists(_)
            | RegistryError::VersionAlreadyExists(_) => 409,
            RegistryError::HasChildren { .. } => 409,
            RegistryError::InvalidName { .. } => 400,
            RegistryError::InvalidOwner(_) => 400,
            RegistryError::DownloadLinkExpired => 403,
            RegistryError::InvalidDownloadLink => 403,
            RegistryError::UploadFailed { .. } => 500,
            RegistryError::PersistFailed { .. } => 500,
            RegistryError::ArtifactMissing(_) => 500,
            RegistryError::StorageUnavailable(_) => 503,
        }
    }
}

impl From<DocumentError> for RegistryError {
    fn from(e: DocumentError) -> Self {
        RegistryError::StorageUnavailable(e.to_string())
    }
}

impl From<BlobError> for RegistryError {
    fn from(e: BlobError) -> Self {
        RegistryError::StorageUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RegistryError::not_found(Level::Module, "acme/net").status_code(), 404);
        assert_eq!(RegistryError::already_exists(Level::Version, "x").status_code(), 409);
        assert_eq!(
            RegistryError::HasChildren {
                level: Level::System,
                id: "acme/net/aws".into(),
                children: Level::Version,
            }
            .status_code(),
            409
        );
        assert_eq!(RegistryError::StorageUnavailable("down".into()).status_code(), 503);
        assert_eq!(RegistryError::InvalidDownloadLink.status_code(), 403);
    }

    #[test]
    fn test_level_constructors() {
        assert!(matches!(
            RegistryError::not_found(Level::System, "a/b/c"),
            RegistryError::SystemNotFound(id) if id == "a/b/c"
        ));
        assert!(matches!(
            RegistryError::already_exists(Level::Namespace, "acme"),
            RegistryError::NamespaceAlreadyExists(_)
        ));
    }

    #[test]
    fn test_insert_classification() {
        let dup = DocumentError::DuplicateKey {
            collection: "versions".into(),
            key: "a/b/c/1.0.0".into(),
        };
        assert!(matches!(
            RegistryError::from_insert(Level::Version, "a/b/c/1.0.0", dup),
            RegistryError::VersionAlreadyExists(_)
        ));
        assert!(matches!(
            RegistryError::from_insert(Level::Version, "x", DocumentError::Timeout(10)),
            RegistryError::StorageUnavailable(_)
        ));
        assert!(matches!(
            RegistryError::from_insert(Level::Version, "x", DocumentError::IoError("disk".into())),
            RegistryError::PersistFailed { .. }
        ));
    }

    #[test]
    fn test_has_children_message() {
        let err = RegistryError::HasChildren {
            level: Level::Namespace,
            id: "acme".into(),
            children: Level::Module,
        };
        assert_eq!(
            err.to_string(),
            "namespace 'acme' still has module entries; delete them first"
        );
    }
}
