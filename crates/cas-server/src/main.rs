//! # CAS demo server
//!
//! Main entry point for the CAS demo server.

#![forbid(unsafe_code)]
#![deny(warnings)]

use cas_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "CAS demo starting against {} ({})",
        config.client.cas_url,
        config.client.protocol
    );

    Server::new(config)?.run().await
}
