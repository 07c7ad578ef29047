//! CLI argument definitions using clap
//!
//! Commands:
//! - modvault init --config <path>
//! - modvault serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// modvault - A private registry for versioned Terraform modules
#[derive(Parser, Debug)]
#[command(name = "modvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directories and a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./modvault.json")]
        config: PathBuf,

        /// Data directory written into a newly created configuration
        #[arg(long, default_value = "./modvault-data")]
        data_dir: PathBuf,
    },

    /// Start the registry HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./modvault.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["modvault", "serve", "--config", "/etc/modvault.json", "--port", "9000"])
            .unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("/etc/modvault.json"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["modvault", "init"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Init { ref config, .. } if config == &PathBuf::from("./modvault.json")
        ));
    }
}
