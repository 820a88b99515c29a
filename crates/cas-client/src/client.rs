//! The CAS client.

use std::fmt;
use std::sync::Arc;

use cas_protocol::{
    urls, AuthenticationResponse, LogoutNotification, ServiceTicketValidator, ValidationOutcome,
};
use cas_session::{generate_session_id, Session, SessionError, SessionStore, SessionStoreHandle};
use chrono::Utc;
use tracing::{Instrument, Span};
use url::Url;

use crate::config::ClientConfig;
use crate::cookie;
use crate::directory::DirectoryService;
use crate::error::{ClientError, ClientResult};

/// Parts shared by every copy of a client.
struct Shared {
    config: ClientConfig,
    validator: ServiceTicketValidator,
    directory: Option<Arc<dyn DirectoryService>>,
}

/// A configured CAS client: validator, session store and settings.
///
/// Cheap to clone; clones share everything. [`with_span`](Self::with_span)
/// derives a client that shares the same data but logs under another span.
#[derive(Clone)]
pub struct CasClient {
    shared: Arc<Shared>,
    sessions: SessionStoreHandle,
    span: Span,
}

impl CasClient {
    /// Creates a client with an in-memory session store.
    ///
    /// # Errors
    ///
    /// See [`CasClientBuilder::build`].
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::builder(config).build()
    }

    /// Starts building a client.
    #[must_use]
    pub fn builder(config: ClientConfig) -> CasClientBuilder {
        CasClientBuilder {
            config,
            http: None,
            store: None,
            directory: None,
            span: None,
        }
    }

    /// Returns a client sharing this one's configuration, validator and
    /// sessions, that logs under `span`.
    #[must_use]
    pub fn with_span(&self, span: Span) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sessions: self.sessions.snapshot(span.clone()),
            span,
        }
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// The ticket validator.
    #[must_use]
    pub fn validator(&self) -> &ServiceTicketValidator {
        &self.shared.validator
    }

    /// The session store.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStoreHandle {
        &self.sessions
    }

    /// The configured directory service, if any.
    #[must_use]
    pub fn directory(&self) -> Option<&Arc<dyn DirectoryService>> {
        self.shared.directory.as_ref()
    }

    /// The span this client logs under.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// CAS login URL with `service` as the callback.
    #[must_use]
    pub fn login_url(&self, service: &Url) -> Url {
        urls::login_url(&self.shared.config.login_url, service)
    }

    /// CAS logout URL with `service` as the callback.
    #[must_use]
    pub fn logout_url(&self, service: &Url) -> Url {
        urls::logout_url(&self.shared.config.logout_url, service)
    }

    /// `Set-Cookie` value binding a new session to the browser.
    #[must_use]
    pub fn session_cookie(&self, value: &str) -> String {
        let config = &self.shared.config;
        cookie::session_cookie(
            &config.cookie_name,
            value,
            config.cookie_secure,
            config.session_max_lifespan,
        )
    }

    /// `Set-Cookie` value removing the session cookie.
    #[must_use]
    pub fn expired_session_cookie(&self) -> String {
        let config = &self.shared.config;
        cookie::expired_session_cookie(&config.cookie_name, config.cookie_secure)
    }

    /// Validates a ticket presented for `service`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] on transport, status or parse
    /// faults. A rejected ticket is not an error.
    pub async fn validate_ticket(&self, service: &Url, ticket: &str) -> ClientResult<ValidationOutcome> {
        let outcome = self
            .shared
            .validator
            .validate(service, ticket)
            .instrument(self.span.clone())
            .await?;
        Ok(outcome)
    }

    /// Validates `ticket` and, if the CAS server accepts it, stores a new
    /// session under a freshly generated cookie value.
    ///
    /// Returns `Ok(None)` if the ticket was rejected.
    ///
    /// # Errors
    ///
    /// Validation faults as in [`validate_ticket`](Self::validate_ticket),
    /// and [`ClientError::Session`] if the session cannot be stored.
    pub async fn establish_session(&self, service: &Url, ticket: &str) -> ClientResult<Option<Arc<Session>>> {
        let response = match self.validate_ticket(service, ticket).await? {
            ValidationOutcome::Authenticated(response) => response,
            ValidationOutcome::Rejected(failure) => {
                self.span.in_scope(|| match &failure {
                    Some(f) => tracing::info!("Ticket rejected by CAS server: {} {}", f.code, f.message),
                    None => tracing::info!("Ticket rejected by CAS server"),
                });
                return Ok(None);
            }
        };

        let session = self.store_session(ticket, response).await?;
        Ok(Some(session))
    }

    async fn store_session(&self, ticket: &str, response: AuthenticationResponse) -> ClientResult<Arc<Session>> {
        let cookie = generate_session_id();
        match self.sessions.create(&cookie, ticket, response.clone()).await {
            Err(SessionError::AlreadyExists) => {
                // Identifier collision; draw once more.
                let cookie = generate_session_id();
                Ok(self.sessions.create(&cookie, ticket, response).await?)
            }
            other => Ok(other?),
        }
    }

    /// Finds the live session for a cookie value.
    ///
    /// Sessions older than the configured lifespan are deleted and reported
    /// as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] on store failures.
    pub async fn resolve_session(&self, cookie: &str) -> ClientResult<Option<Arc<Session>>> {
        let Some(session) = self.sessions.get(cookie).await? else {
            return Ok(None);
        };

        if session.is_expired(self.shared.config.session_max_lifespan, Utc::now()) {
            self.span
                .in_scope(|| tracing::info!("Session for {} expired", session.response().user()));
            match self.sessions.delete_by_cookie(cookie).await {
                // A concurrent logout got there first.
                Ok(_) | Err(SessionError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Processes a Single Logout notification: deletes the session created
    /// from the ticket named by its `SessionIndex`.
    ///
    /// The session index is a ticket, never a cookie value, so the lookup
    /// goes through the ticket index only.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Logout`] if the payload cannot be parsed and
    /// [`ClientError::Session`] if no session matches.
    pub async fn process_logout(&self, payload: &str) -> ClientResult<Arc<Session>> {
        let notification =
            LogoutNotification::parse(payload).map_err(|e| ClientError::Logout(e.to_string()))?;
        self.span.in_scope(|| {
            tracing::debug!("Logout notification for ticket {}", notification.session_index);
        });

        let session = self
            .sessions
            .delete_by_ticket(&notification.session_index)
            .await?;
        Ok(session)
    }
}

impl fmt::Debug for CasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasClient")
            .field("cas_url", &self.shared.config.cas_url.as_str())
            .field("protocol", &self.shared.config.protocol)
            .field("directory", &self.shared.directory.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CasClient`].
#[must_use]
pub struct CasClientBuilder {
    config: ClientConfig,
    http: Option<reqwest::Client>,
    store: Option<Arc<dyn SessionStore>>,
    directory: Option<Arc<dyn DirectoryService>>,
    span: Option<Span>,
}

impl CasClientBuilder {
    /// Uses an existing HTTP client for validation requests.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Uses `store` instead of a fresh in-memory store.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Plugs in a directory service.
    pub fn directory(mut self, directory: Arc<dyn DirectoryService>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Logs under `span` instead of the span current at build time.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn build(self) -> ClientResult<CasClient> {
        let config = self.config;
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(config.user_agent.as_str())
                .build()
                .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?,
        };

        let validator =
            ServiceTicketValidator::with_http_client(http, config.cas_url.clone(), config.protocol)
                .with_timeout(config.validation_timeout);

        let span = self.span.unwrap_or_else(Span::current);
        let sessions = match self.store {
            Some(store) => SessionStoreHandle::new(store),
            None => SessionStoreHandle::in_memory(),
        }
        .snapshot(span.clone());

        tracing::info!(
            "CAS client configured for {} ({})",
            config.cas_url,
            config.protocol
        );

        Ok(CasClient {
            shared: Arc::new(Shared {
                config,
                validator,
                directory: self.directory,
            }),
            sessions,
            span,
        })
    }
}
