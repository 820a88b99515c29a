//! Session store error types.

use thiserror::Error;

/// Errors that can occur during session store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already stored under this cookie value.
    #[error("session already exists for this cookie")]
    AlreadyExists,

    /// The ticket already produced another session.
    #[error("ticket already bound to a session: {0}")]
    TicketInUse(String),

    /// No session matched the key.
    #[error("session not found for {0}")]
    NotFound(String),
}

impl SessionError {
    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for session store operations.
pub type SessionResult<T> = Result<T, SessionError>;
