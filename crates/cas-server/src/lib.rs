//! # cas-server
//!
//! A small web service protected by the CAS client, for trying the client
//! against a real CAS server.
//!
//! - `/` - public; reports whether the caller is signed in
//! - `/me` - the caller's identity, or a redirect to CAS login
//! - `/logout` - local logout, then CAS logout
//! - `/health` - health check
//!
//! ## Usage
//!
//! ```ignore
//! use cas_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod router;

pub use config::ServerConfig;
pub use router::create_router;

use std::net::SocketAddr;

use cas_client::CasClient;
use cas_session::spawn_session_sweeper;
use tokio::net::TcpListener;

/// The demo server.
pub struct Server {
    config: ServerConfig,
    client: CasClient,
}

impl Server {
    /// Creates a new server instance.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let client = CasClient::new(config.client.clone())?;
        Ok(Self { config, client })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper = self.config.session_sweep_interval.map(|interval| {
            spawn_session_sweeper(
                self.client.sessions().clone(),
                interval,
                self.config.client.session_max_lifespan,
            )
        });

        let app = create_router(self.client.clone());

        let addr: SocketAddr = self.config.bind_address().parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the CAS client.
    #[must_use]
    pub const fn client(&self) -> &CasClient {
        &self.client
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
