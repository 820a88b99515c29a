//! Local sessions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cas_protocol::AuthenticationResponse;
use chrono::{DateTime, Utc};

/// A validated login bound to a browser cookie.
///
/// Created once when a ticket validates and never modified afterwards; the
/// store hands out shared `Arc<Session>` values so a reader always sees a
/// complete session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
    ticket: String,
    response: Arc<AuthenticationResponse>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session stamped with the current time.
    #[must_use]
    pub fn new(
        cookie: impl Into<String>,
        ticket: impl Into<String>,
        response: AuthenticationResponse,
    ) -> Self {
        Self::new_at(cookie, ticket, response, Utc::now())
    }

    /// Creates a session with an explicit creation time.
    #[must_use]
    pub fn new_at(
        cookie: impl Into<String>,
        ticket: impl Into<String>,
        response: AuthenticationResponse,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            cookie: cookie.into(),
            ticket: ticket.into(),
            response: Arc::new(response),
            created_at,
        }
    }

    /// The session cookie value.
    #[must_use]
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// The service ticket this session was created from.
    #[must_use]
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// The validation result.
    #[must_use]
    pub fn response(&self) -> &AuthenticationResponse {
        &self.response
    }

    /// Shared handle to the validation result.
    #[must_use]
    pub fn response_arc(&self) -> Arc<AuthenticationResponse> {
        Arc::clone(&self.response)
    }

    /// When the session was created.
    #[must_use]
    pub const fn creation_time(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks whether the session is at least `max_age` old at `now`.
    #[must_use]
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at)
            .to_std()
            .is_ok_and(|age| age >= max_age)
    }
}

// The cookie value is a bearer credential; keep it out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &"<redacted>")
            .field("ticket", &self.ticket)
            .field("user", &self.response.user())
            .field("created_at", &self.created_at)
            .finish()
    }
}
