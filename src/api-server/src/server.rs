//! HTTP server setup and lifecycle management

use crate::{routes, state::AppState};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP server instance
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind, serve, and block until SIGINT or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = self.config.addr();

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "Server listening");

        let app = routes::create_router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Server shutdown complete");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
///
/// A handler that cannot be installed never fires instead of aborting
/// the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Builder for creating a server with custom configuration
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    state: Option<AppState>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> Result<Server> {
        let state = self.state.context("Application state is required")?;
        Ok(Server::new(self.config, state))
    }
}
