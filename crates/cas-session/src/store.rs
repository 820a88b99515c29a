//! Session store trait and in-memory implementation.
//!
//! A store keeps two indexes over the same sessions: cookie value to session,
//! and service ticket to cookie value. The ticket index exists for Single
//! Logout, where the CAS server names the session by the ticket it was
//! created from, never by the browser cookie.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cas_protocol::AuthenticationResponse;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Key for looking up or deleting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey<'a> {
    /// The browser's session cookie value.
    Cookie(&'a str),
    /// The service ticket the session was created from.
    Ticket(&'a str),
}

impl fmt::Display for SessionKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookie(_) => f.write_str("cookie"),
            Self::Ticket(ticket) => write!(f, "ticket {ticket}"),
        }
    }
}

/// Storage for sessions, indexed by cookie value and by ticket.
///
/// Implementations must be safe under concurrent use without any locking by
/// the caller. Every operation that touches both indexes must appear atomic:
/// a concurrent reader sees a session either fully present in both indexes
/// or absent from both.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session for `cookie`, created from `ticket`.
    ///
    /// Fails with [`SessionError::AlreadyExists`] if the cookie is taken and
    /// with [`SessionError::TicketInUse`] if the ticket already produced a
    /// session. Delete first to replace.
    async fn create(
        &self,
        cookie: &str,
        ticket: &str,
        response: AuthenticationResponse,
    ) -> SessionResult<Arc<Session>>;

    /// Gets the session for a cookie value.
    async fn get(&self, cookie: &str) -> SessionResult<Option<Arc<Session>>>;

    /// Gets the session created from a ticket.
    async fn get_by_ticket(&self, ticket: &str) -> SessionResult<Option<Arc<Session>>>;

    /// Removes a session and both of its index entries.
    ///
    /// Returns [`SessionError::NotFound`] if nothing matched.
    async fn delete(&self, key: SessionKey<'_>) -> SessionResult<Arc<Session>>;

    /// Removes every session at least `max_age` old at `now`.
    ///
    /// Returns the number of sessions removed.
    async fn evict_expired(&self, max_age: Duration, now: DateTime<Utc>) -> SessionResult<usize>;

    /// Number of stored sessions.
    async fn count(&self) -> SessionResult<usize>;
}

#[derive(Default)]
struct Indexes {
    by_cookie: HashMap<String, Arc<Session>>,
    by_ticket: HashMap<String, String>,
}

impl Indexes {
    /// Removes the session under `cookie` from both maps.
    fn remove_cookie(&mut self, cookie: &str) -> Option<Arc<Session>> {
        let session = self.by_cookie.remove(cookie)?;
        self.by_ticket.remove(session.ticket());
        Some(session)
    }
}

/// In-memory session store.
///
/// Both indexes live behind a single lock so every multi-key update is one
/// critical section. The lock is never held across an `.await`.
#[derive(Default)]
pub struct InMemorySessionStore {
    indexes: RwLock<Indexes>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        cookie: &str,
        ticket: &str,
        response: AuthenticationResponse,
    ) -> SessionResult<Arc<Session>> {
        let mut indexes = self.indexes.write();
        if indexes.by_cookie.contains_key(cookie) {
            return Err(SessionError::AlreadyExists);
        }
        if indexes.by_ticket.contains_key(ticket) {
            return Err(SessionError::TicketInUse(ticket.to_string()));
        }

        let session = Arc::new(Session::new(cookie, ticket, response));
        indexes
            .by_cookie
            .insert(cookie.to_string(), Arc::clone(&session));
        indexes
            .by_ticket
            .insert(ticket.to_string(), cookie.to_string());
        Ok(session)
    }

    async fn get(&self, cookie: &str) -> SessionResult<Option<Arc<Session>>> {
        Ok(self.indexes.read().by_cookie.get(cookie).cloned())
    }

    async fn get_by_ticket(&self, ticket: &str) -> SessionResult<Option<Arc<Session>>> {
        let indexes = self.indexes.read();
        Ok(indexes
            .by_ticket
            .get(ticket)
            .and_then(|cookie| indexes.by_cookie.get(cookie))
            .cloned())
    }

    async fn delete(&self, key: SessionKey<'_>) -> SessionResult<Arc<Session>> {
        let mut indexes = self.indexes.write();
        let removed = match key {
            SessionKey::Cookie(cookie) => indexes.remove_cookie(cookie),
            SessionKey::Ticket(ticket) => match indexes.by_ticket.get(ticket).cloned() {
                Some(cookie) => indexes.remove_cookie(&cookie),
                None => None,
            },
        };
        removed.ok_or_else(|| SessionError::NotFound(key.to_string()))
    }

    async fn evict_expired(&self, max_age: Duration, now: DateTime<Utc>) -> SessionResult<usize> {
        let mut indexes = self.indexes.write();
        let expired: Vec<String> = indexes
            .by_cookie
            .iter()
            .filter(|(_, session)| session.is_expired(max_age, now))
            .map(|(cookie, _)| cookie.clone())
            .collect();

        for cookie in &expired {
            indexes.remove_cookie(cookie);
        }
        Ok(expired.len())
    }

    async fn count(&self) -> SessionResult<usize> {
        Ok(self.indexes.read().by_cookie.len())
    }
}
