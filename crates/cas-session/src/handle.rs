//! Shared store handles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cas_protocol::AuthenticationResponse;
use chrono::{DateTime, Utc};
use tracing::{Instrument, Span};

use crate::error::SessionResult;
use crate::session::Session;
use crate::store::{InMemorySessionStore, SessionKey, SessionStore};

/// A view onto a shared [`SessionStore`], tagged with the span that owns it.
///
/// Cloning or snapshotting a handle never copies sessions: every handle made
/// from the same store reads and writes the same data. The owner span only
/// decides where this handle's store operations are logged.
#[derive(Clone)]
pub struct SessionStoreHandle {
    store: Arc<dyn SessionStore>,
    owner: Span,
}

impl SessionStoreHandle {
    /// Wraps a store, owned by the current span.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            owner: Span::current(),
        }
    }

    /// Handle over a fresh [`InMemorySessionStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    /// Returns a handle over the same sessions, owned by `owner`.
    #[must_use]
    pub fn snapshot(&self, owner: Span) -> Self {
        Self {
            store: Arc::clone(&self.store),
            owner,
        }
    }

    /// The span this handle logs under.
    #[must_use]
    pub const fn owner(&self) -> &Span {
        &self.owner
    }

    /// Checks whether both handles view the same backing store.
    #[must_use]
    pub fn shares_backing_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// See [`SessionStore::create`].
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn create(
        &self,
        cookie: &str,
        ticket: &str,
        response: AuthenticationResponse,
    ) -> SessionResult<Arc<Session>> {
        let session = self
            .store
            .create(cookie, ticket, response)
            .instrument(self.owner.clone())
            .await?;
        self.owner.in_scope(|| {
            tracing::info!("Created session for {}", session.response().user());
            tracing::debug!("Session indexed by ticket {}", session.ticket());
        });
        Ok(session)
    }

    /// See [`SessionStore::get`].
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn get(&self, cookie: &str) -> SessionResult<Option<Arc<Session>>> {
        self.store.get(cookie).instrument(self.owner.clone()).await
    }

    /// See [`SessionStore::get_by_ticket`].
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn get_by_ticket(&self, ticket: &str) -> SessionResult<Option<Arc<Session>>> {
        self.store
            .get_by_ticket(ticket)
            .instrument(self.owner.clone())
            .await
    }

    /// See [`SessionStore::delete`].
    ///
    /// # Errors
    ///
    /// [`SessionError::NotFound`](crate::SessionError::NotFound) if nothing
    /// matched `key`.
    pub async fn delete(&self, key: SessionKey<'_>) -> SessionResult<Arc<Session>> {
        let session = self.store.delete(key).instrument(self.owner.clone()).await?;
        self.owner
            .in_scope(|| tracing::info!("Deleted session for {} by {}", session.response().user(), key));
        Ok(session)
    }

    /// Deletes the session bound to a cookie value.
    ///
    /// # Errors
    ///
    /// See [`delete`](Self::delete).
    pub async fn delete_by_cookie(&self, cookie: &str) -> SessionResult<Arc<Session>> {
        self.delete(SessionKey::Cookie(cookie)).await
    }

    /// Deletes the session created from a ticket.
    ///
    /// # Errors
    ///
    /// See [`delete`](Self::delete).
    pub async fn delete_by_ticket(&self, ticket: &str) -> SessionResult<Arc<Session>> {
        self.delete(SessionKey::Ticket(ticket)).await
    }

    /// See [`SessionStore::evict_expired`].
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn evict_expired(&self, max_age: Duration, now: DateTime<Utc>) -> SessionResult<usize> {
        let evicted = self
            .store
            .evict_expired(max_age, now)
            .instrument(self.owner.clone())
            .await?;
        if evicted > 0 {
            self.owner
                .in_scope(|| tracing::info!("Evicted {} expired sessions", evicted));
        }
        Ok(evicted)
    }

    /// See [`SessionStore::count`].
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn count(&self) -> SessionResult<usize> {
        self.store.count().instrument(self.owner.clone()).await
    }
}

impl Default for SessionStoreHandle {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for SessionStoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStoreHandle")
            .field("owner", &self.owner.metadata().map(|m| m.name()))
            .finish_non_exhaustive()
    }
}
