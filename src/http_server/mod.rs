//! # HTTP Server Module
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/.well-known/terraform.json` - Terraform service discovery
//! - `/api/v1/namespace/*` - Registry management
//! - `/modules/v1/*` - Terraform module registry protocol

pub mod config;
pub mod errors;
pub mod health_routes;
pub mod protocol_routes;
pub mod registry_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use registry_routes::RegistryState;
pub use server::HttpServer;
