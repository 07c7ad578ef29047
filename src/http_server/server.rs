//! # HTTP Server
//!
//! Combines the health, management and protocol routers into one axum
//! application.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::protocol_routes::protocol_routes;
use super::registry_routes::{registry_routes, RegistryState};
use crate::registry::download::MODULES_ROOT;
use crate::registry::Registry;

/// Default request body limit (100 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024 * 1024;

/// HTTP server for the registry
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server with the default body limit
    pub fn new(config: HttpServerConfig, registry: Registry) -> Self {
        Self::with_body_limit(config, registry, DEFAULT_BODY_LIMIT)
    }

    pub fn with_body_limit(config: HttpServerConfig, registry: Registry, body_limit: usize) -> Self {
        let state = Arc::new(RegistryState::new(registry));
        let router = Self::build_router(&config, state, body_limit);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<RegistryState>, body_limit: usize) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .nest("/api/v1", registry_routes(state.clone()))
            .nest(MODULES_ROOT, protocol_routes(state))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process stops
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "registry listening");
        info!("service discovery: http://{}/.well-known/terraform.json", addr);

        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryOptions;

    #[test]
    fn test_server_creation() {
        let server = HttpServer::new(
            HttpServerConfig::with_port(9000),
            Registry::in_memory(RegistryOptions::default()),
        );
        assert_eq!(server.socket_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_router_builds_with_origins() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..HttpServerConfig::default()
        };
        let _router =
            HttpServer::new(config, Registry::in_memory(RegistryOptions::default())).router();
    }
}
