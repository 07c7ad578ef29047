//! CLI-specific error types
//!
//! Any of these aborts the command with a non-zero exit. The rendered
//! message starts with a stable `MODVAULT_CLI_*` code for scripts.

use std::io;

use thiserror::Error;

use crate::document_store::DocumentError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("MODVAULT_CLI_CONFIG_ERROR: {0}")]
    Config(String),

    #[error("MODVAULT_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    #[error("MODVAULT_CLI_IO_ERROR: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MODVAULT_CLI_STORAGE_ERROR: failed to open catalog: {0}")]
    Storage(#[from] DocumentError),

    #[error("MODVAULT_CLI_BOOT_FAILED: {0}")]
    BootFailed(String),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::BootFailed(msg.into())
    }

    /// Stable code for the failure class
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "MODVAULT_CLI_CONFIG_ERROR",
            Self::Io(_) | Self::Json(_) => "MODVAULT_CLI_IO_ERROR",
            Self::Storage(_) => "MODVAULT_CLI_STORAGE_ERROR",
            Self::BootFailed(_) => "MODVAULT_CLI_BOOT_FAILED",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("storage_timeout_secs must be > 0");
        assert_eq!(
            err.to_string(),
            "MODVAULT_CLI_CONFIG_ERROR: storage_timeout_secs must be > 0"
        );
        assert_eq!(err.code(), "MODVAULT_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_catalog_errors_are_storage_errors() {
        let err: CliError = DocumentError::InvalidCollection("bad/name".to_string()).into();
        assert_eq!(err.code(), "MODVAULT_CLI_STORAGE_ERROR");
        assert!(err.to_string().starts_with("MODVAULT_CLI_STORAGE_ERROR: failed to open catalog"));
    }
}
