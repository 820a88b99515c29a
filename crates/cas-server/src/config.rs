//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::time::Duration;

use cas_client::ClientConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// How often expired sessions are swept. `None` disables the sweeper.
    pub session_sweep_interval: Option<Duration>,

    /// Log level.
    pub log_level: String,

    /// CAS client configuration.
    pub client: ClientConfig,
}

impl ServerConfig {
    /// Creates a configuration with default server settings.
    #[must_use]
    pub fn new(client: ClientConfig) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            session_sweep_interval: Some(Duration::from_secs(300)),
            log_level: "info".to_string(),
            client,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// The client configuration is read first, which also loads a `.env`
    /// file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        let client = ClientConfig::from_env()?;

        let host = std::env::var("CAS_DEMO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("CAS_DEMO_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let session_sweep_interval = std::env::var("CAS_SESSION_SWEEP_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Some(Duration::from_secs(300)), |secs| {
                (secs > 0).then(|| Duration::from_secs(secs))
            });

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            session_sweep_interval,
            log_level,
            client,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(client: ClientConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            session_sweep_interval: None,
            log_level: "debug".to_string(),
            client,
        }
    }

    /// The address to bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
