//! CLI module for modvault
//!
//! Provides command-line interface for:
//! - init: Write a default configuration and create the data directories
//! - serve: Boot the registry and its HTTP API

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, serve};
pub use config::{BlobStoreConfig, Config, DocumentStoreKind, DownloadConfig};
pub use errors::{CliError, CliResult};
