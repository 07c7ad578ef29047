//! CLI command implementations

use std::fs;
use std::path::Path;

use serde_json::json;
use tracing::info;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::http_server::HttpServer;
use crate::logging;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, data_dir } => init(&config, &data_dir),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Write a default configuration (unless one exists) and create the
/// directories it points at
pub fn init(config_path: &Path, data_dir: &Path) -> CliResult<()> {
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        let config = Config::with_data_dir(data_dir);
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, serde_json::to_vec_pretty(&config)?).map_err(|e| {
            CliError::config_error(format!(
                "Failed to write config {}: {}",
                config_path.display(),
                e
            ))
        })?;
        config
    };

    for dir in [config.catalog_dir(), config.blob_root()] {
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    println!(
        "{}",
        json!({
            "initialized": true,
            "config": config_path.display().to_string(),
            "data_dir": config.data_dir.display().to_string(),
        })
    );
    Ok(())
}

/// Boot the registry and serve HTTP until the process is stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    logging::init(&config.log_filter);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let registry = config.build_registry().await?;
        info!(
            data_dir = %config.data_dir.display(),
            store = ?config.document_store,
            mode = ?config.download.mode,
            "registry ready"
        );

        HttpServer::with_body_limit(config.http.clone(), registry, config.max_artifact_bytes)
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}
