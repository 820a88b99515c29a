//! Service ticket validation.
//!
//! Exchanges a service ticket for an [`AuthenticationResponse`] by calling
//! the CAS server's validation endpoint for the configured protocol version.
//!
//! The validator keeps no per-ticket state: whether a ticket may be validated
//! twice is for the CAS server to decide.
//!
//! [`AuthenticationResponse`]: crate::AuthenticationResponse

use std::time::Duration;

use url::Url;

use crate::error::{CasError, CasResult};
use crate::parser::parse_response;
use crate::types::{ProtocolVersion, ValidationOutcome};
use crate::urls;

/// Default per-request timeout for validation calls.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default `User-Agent` sent to the CAS server.
pub const DEFAULT_USER_AGENT: &str = concat!("cas-client/", env!("CARGO_PKG_VERSION"));

/// Validates service tickets against one CAS server.
#[derive(Debug, Clone)]
pub struct ServiceTicketValidator {
    http: reqwest::Client,
    cas_url: Url,
    version: ProtocolVersion,
    timeout: Duration,
}

impl ServiceTicketValidator {
    /// Creates a validator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CasError::Transport`] if the HTTP client cannot be built.
    pub fn new(cas_url: Url, version: ProtocolVersion) -> CasResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| CasError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(http, cas_url, version))
    }

    /// Creates a validator that shares an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, cas_url: Url, version: ProtocolVersion) -> Self {
        Self {
            http,
            cas_url,
            version,
            timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    /// Sets the default per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured protocol version.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// The CAS server base URL.
    #[must_use]
    pub const fn cas_url(&self) -> &Url {
        &self.cas_url
    }

    /// The default per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the validation URL for this validator's protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`CasError::InvalidUrl`] if the CAS URL cannot be a base.
    pub fn validation_url(&self, service: &Url, ticket: &str) -> CasResult<Url> {
        urls::validate_url(self.version, &self.cas_url, service, ticket)
    }

    /// Validates `ticket` for `service` using the default timeout.
    ///
    /// # Errors
    ///
    /// See [`validate_with_timeout`](Self::validate_with_timeout).
    pub async fn validate(&self, service: &Url, ticket: &str) -> CasResult<ValidationOutcome> {
        self.validate_with_timeout(service, ticket, self.timeout).await
    }

    /// Validates `ticket` for `service`, giving up after `timeout`.
    ///
    /// A rejected ticket is `Ok(ValidationOutcome::Rejected(_))`.
    ///
    /// # Errors
    ///
    /// - [`CasError::Transport`] / [`CasError::Timeout`] if the CAS server
    ///   cannot be reached in time
    /// - [`CasError::Validation`] if it answers with a non-2xx status
    /// - [`CasError::Parse`] if the body cannot be interpreted
    pub async fn validate_with_timeout(
        &self,
        service: &Url,
        ticket: &str,
        timeout: Duration,
    ) -> CasResult<ValidationOutcome> {
        let url = self.validation_url(service, ticket)?;
        tracing::debug!("Attempting {} ticket validation with {}", self.version, url);

        let response = self.http.get(url.clone()).timeout(timeout).send().await?;
        let status = response.status();
        tracing::debug!("Request GET {} returned {}", url, status);

        let body = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!("CAS server rejected validation request with {}", status);
            return Err(CasError::Validation {
                status: status.as_u16(),
                body,
            });
        }

        let outcome = parse_response(self.version, &body)?;
        tracing::debug!("Parsed validation outcome: {:?}", outcome);
        Ok(outcome)
    }
}
