//! Client error types.
//!
//! Every error the request path can produce maps to an HTTP status, so
//! handlers and the middleware can return them directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cas_protocol::{AttributeError, CasError};
use cas_session::SessionError;
use thiserror::Error;

/// Errors raised by the CAS client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A helper ran on a request that never passed through the CAS
    /// middleware.
    #[error("cas: no client associated with request")]
    NoClientBound,

    /// Ticket validation failed.
    #[error(transparent)]
    Protocol(#[from] CasError),

    /// Session store failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A Single Logout notification could not be processed.
    #[error("cas: logout request: {0}")]
    Logout(String),

    /// An attribute could not be read as the requested type.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Invalid client configuration.
    #[error("cas: configuration: {0}")]
    Config(String),

    /// The URL of the current request could not be determined.
    #[error("cas: service url: {0}")]
    ServiceUrl(String),

    /// No directory service is configured.
    #[error("cas: no directory service configured")]
    DirectoryUnavailable,

    /// The directory service call failed.
    #[error("cas: directory: {0}")]
    Directory(String),

    /// The request carries no authenticated user.
    #[error("cas: not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Protocol(CasError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Protocol(_) | Self::Directory(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUrl(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::NoClientBound
            | Self::Session(_)
            | Self::Logout(_)
            | Self::Attribute(_)
            | Self::Config(_)
            | Self::DirectoryUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        (self.http_status(), self.to_string()).into_response()
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
