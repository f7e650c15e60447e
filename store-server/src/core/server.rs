//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::net::SocketAddr;
use std::time::Duration;

use crate::api;
use crate::core::{Config, Result, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    /// Create server with initialized state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> Result<()> {
        let tasks = self.state.start_background_tasks();
        let app = api::build_app(&self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            environment = %self.config.environment,
            "Store server listening on {}",
            addr
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tasks
            .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
            .await;
        Ok(())
    }
}
