//! # HTTP Server
//!
//! Combines the health and document routers into one Axum app. The
//! document routes are mounted at the root and again under `/api`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::document_routes::{document_routes, DocumentsState};
use super::health_routes::health_routes;
use crate::observability::{log_event, log_event_with_fields, Event};

/// HTTP server for the document API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given document state
    pub fn new(config: HttpServerConfig, state: Arc<DocumentsState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<DocumentsState>) -> Router {
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
            .merge(document_routes(state.clone()))
            .nest("/api", document_routes(state))
            .layer(
                ServiceBuilder::new()
                    .layer(cors)
                    .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
            )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(
            Event::Serving,
            &[
                ("addr", &addr.to_string()),
                ("public_url", &self.config.public_url),
            ],
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    // If the handler cannot be installed the server simply runs until killed
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentStore, MemoryRecordStore};
    use crate::file_storage::LocalBackend;
    use crate::http_server::UrlBuilder;
    use tempfile::TempDir;

    fn state(temp: &TempDir, config: &HttpServerConfig) -> Arc<DocumentsState> {
        let store = DocumentStore::new(
            LocalBackend::new(temp.path().to_path_buf()),
            MemoryRecordStore::new(),
        );
        Arc::new(DocumentsState::new(store, UrlBuilder::from_config(config)))
    }

    #[test]
    fn test_server_with_custom_port() {
        let temp = TempDir::new().unwrap();
        let config = HttpServerConfig::with_port(8080);
        let server = HttpServer::new(config.clone(), state(&temp, &config));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_open_cors() {
        let temp = TempDir::new().unwrap();
        let config = HttpServerConfig {
            cors_origins: Vec::new(),
            ..Default::default()
        };
        let _router = HttpServer::new(config.clone(), state(&temp, &config)).router();
    }
}
