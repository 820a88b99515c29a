//! Response parsing.
//!
//! Turns the raw body of a validation response into a [`ValidationOutcome`].
//! Parsing never consults external state: the same bytes always give the
//! same result.

pub mod date;
mod text;
mod xml;

pub use text::parse_v1;
pub use xml::parse_service_response;

use crate::error::ParseError;
use crate::types::{ProtocolVersion, ValidationOutcome};

/// Parses a validation response body for the given protocol version.
///
/// # Errors
///
/// Returns a [`ParseError`] if the body is not valid UTF-8 or does not match
/// the version's response format.
pub fn parse_response(
    version: ProtocolVersion,
    body: &[u8],
) -> Result<ValidationOutcome, ParseError> {
    let body = std::str::from_utf8(body)
        .map_err(|e| ParseError::UnexpectedResponse(format!("invalid UTF-8: {e}")))?;

    match version {
        ProtocolVersion::V1 => parse_v1(body),
        ProtocolVersion::V2 | ProtocolVersion::V3 => parse_service_response(body),
    }
}
