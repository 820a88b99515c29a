//! CAS protocol error types.
//!
//! Separates the three ways a validation call can go wrong: the CAS server
//! could not be reached (or timed out), it answered with a non-2xx status, or
//! it answered with a body that could not be interpreted. A well-formed
//! "ticket not valid" answer is not an error at all; see
//! [`ValidationOutcome`](crate::ValidationOutcome).

use thiserror::Error;

/// Result type for CAS protocol operations.
pub type CasResult<T> = Result<T, CasError>;

/// CAS protocol errors.
#[derive(Debug, Error)]
pub enum CasError {
    /// The CAS server URL or the service URL could not be used.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The validation request could not be sent or its body not read.
    #[error("cas: transport error: {0}")]
    Transport(String),

    /// The validation request did not complete within the allowed time.
    #[error("cas: validation request timed out")]
    Timeout,

    /// The CAS server answered with a non-2xx status.
    #[error("cas: validate ticket: {body}")]
    Validation {
        /// HTTP status returned by the CAS server.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body could not be parsed.
    #[error("cas: {0}")]
    Parse(#[from] ParseError),
}

impl CasError {
    /// Returns true if this error came from talking to the CAS server rather
    /// than from interpreting its answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Validation { .. })
    }
}

impl From<reqwest::Error> for CasError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for CasError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Errors raised while decoding a validation response or a logout
/// notification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// XML was not well formed.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// A required element was absent.
    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    /// The body did not match any known response shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// An element carried a value of the wrong kind.
    #[error("invalid value for {element}: {value:?}")]
    InvalidValue {
        /// The element name.
        element: String,
        /// The offending text.
        value: String,
    },
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}
