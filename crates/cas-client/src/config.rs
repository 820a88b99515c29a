//! Client configuration.
//!
//! Configuration is built in code or loaded from environment variables with
//! sensible defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cas_protocol::urls::endpoint_url;
use cas_protocol::validator::{DEFAULT_USER_AGENT, DEFAULT_VALIDATION_TIMEOUT};
use cas_protocol::ProtocolVersion;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "_cas_session";

/// Default maximum session lifespan (8 hours).
pub const DEFAULT_SESSION_MAX_LIFESPAN: Duration = Duration::from_secs(8 * 60 * 60);

/// What the middleware does when ticket validation fails with an error
/// (as opposed to the CAS server rejecting the ticket).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationErrorPolicy {
    /// Log the error and continue the request unauthenticated.
    #[default]
    Continue,
    /// Abort the request with the error's status code.
    Reject,
}

impl FromStr for ValidationErrorPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "reject" => Ok(Self::Reject),
            other => Err(ClientError::Config(format!(
                "unknown validation error policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for ValidationErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// CAS client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// CAS server base URL, including any path prefix.
    pub cas_url: Url,

    /// Protocol version used for ticket validation.
    pub protocol: ProtocolVersion,

    /// Login page users are redirected to.
    pub login_url: Url,

    /// Logout page users are redirected to.
    pub logout_url: Url,

    /// Public base URL of this application. When set, its scheme and
    /// authority replace the ones the request presents.
    pub service_url: Option<Url>,

    /// Session cookie name.
    pub cookie_name: String,

    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,

    /// Timeout for each validation request.
    pub validation_timeout: Duration,

    /// Sessions older than this are discarded.
    pub session_max_lifespan: Duration,

    /// Behaviour when validation fails with an error.
    pub on_validation_error: ValidationErrorPolicy,

    /// `User-Agent` sent to the CAS server.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the CAS server at `cas_url` with
    /// defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `cas_url` cannot be a base URL.
    pub fn new(cas_url: Url) -> ClientResult<Self> {
        let login_url = endpoint_url(&cas_url, "login").map_err(config_error)?;
        let logout_url = endpoint_url(&cas_url, "logout").map_err(config_error)?;
        Ok(Self {
            cas_url,
            protocol: ProtocolVersion::default(),
            login_url,
            logout_url,
            service_url: None,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
            session_max_lifespan: DEFAULT_SESSION_MAX_LIFESPAN,
            on_validation_error: ValidationErrorPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Loads configuration from environment variables, reading a `.env`
    /// file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `CAS_URL` is missing or any
    /// variable holds an invalid value.
    pub fn from_env() -> ClientResult<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cas_url = var("CAS_URL")
            .ok_or_else(|| ClientError::Config("CAS_URL environment variable is required".into()))
            .and_then(|v| parse_url("CAS_URL", &v))?;
        let mut config = Self::new(cas_url)?;

        if let Some(v) = var("CAS_PROTOCOL") {
            config.protocol = v
                .parse()
                .map_err(|e| ClientError::Config(format!("CAS_PROTOCOL: {e}")))?;
        }
        if let Some(v) = var("CAS_LOGIN_URL") {
            config.login_url = parse_url("CAS_LOGIN_URL", &v)?;
        }
        if let Some(v) = var("CAS_LOGOUT_URL") {
            config.logout_url = parse_url("CAS_LOGOUT_URL", &v)?;
        }
        if let Some(v) = var("CAS_SERVICE_URL") {
            config.service_url = Some(parse_url("CAS_SERVICE_URL", &v)?);
        }
        if let Some(v) = var("CAS_COOKIE_NAME") {
            config.cookie_name = v;
        }
        if let Some(v) = var("CAS_COOKIE_SECURE") {
            config.cookie_secure = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Some(v) = var("CAS_VALIDATION_TIMEOUT_SECS") {
            config.validation_timeout = parse_secs("CAS_VALIDATION_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("CAS_SESSION_MAX_LIFESPAN_SECS") {
            config.session_max_lifespan = parse_secs("CAS_SESSION_MAX_LIFESPAN_SECS", &v)?;
        }
        if let Some(v) = var("CAS_ON_VALIDATION_ERROR") {
            config.on_validation_error = v.parse()?;
        }

        Ok(config)
    }

    /// Sets the protocol version.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the login page URL.
    #[must_use]
    pub fn with_login_url(mut self, url: Url) -> Self {
        self.login_url = url;
        self
    }

    /// Sets the logout page URL.
    #[must_use]
    pub fn with_logout_url(mut self, url: Url) -> Self {
        self.logout_url = url;
        self
    }

    /// Sets the public base URL of this application.
    #[must_use]
    pub fn with_service_url(mut self, url: Url) -> Self {
        self.service_url = Some(url);
        self
    }

    /// Sets the session cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Marks the session cookie `Secure`.
    #[must_use]
    pub const fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Sets the validation request timeout.
    #[must_use]
    pub const fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Sets the maximum session lifespan.
    #[must_use]
    pub const fn with_session_max_lifespan(mut self, lifespan: Duration) -> Self {
        self.session_max_lifespan = lifespan;
        self
    }

    /// Sets the validation error policy.
    #[must_use]
    pub const fn with_validation_error_policy(mut self, policy: ValidationErrorPolicy) -> Self {
        self.on_validation_error = policy;
        self
    }

    /// Sets the `User-Agent` sent to the CAS server.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn config_error(err: impl fmt::Display) -> ClientError {
    ClientError::Config(err.to_string())
}

fn parse_url(key: &str, value: &str) -> ClientResult<Url> {
    Url::parse(value).map_err(|e| ClientError::Config(format!("{key}: {e}")))
}

fn parse_secs(key: &str, value: &str) -> ClientResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ClientError::Config(format!("{key}: {e}")))
}
