//! API Server
//!
//! Serves the REST API until shutdown is triggered.

use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use super::rest::RestRouter;
use crate::controlplane::ProvisionController;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub rest_addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// REST API server with graceful shutdown
pub struct ApiServer {
    config: ApiServerConfig,
    controller: Arc<ProvisionController>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, controller: Arc<ProvisionController>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            controller,
            shutdown_tx,
        }
    }

    /// Run until `shutdown()` is called
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.rest_addr;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let app = RestRouter::new(self.controller.clone()).build();

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            Error::Internal(format!("Failed to bind REST server: {}", e))
        })?;
        info!("REST API listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

        Ok(())
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.rest_addr.port(), 8090);
    }
}
