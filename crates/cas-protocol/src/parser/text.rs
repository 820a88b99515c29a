//! CAS 1.0 plain-text responses.
//!
//! ```text
//! yes\n<username>\n
//! no\n\n
//! ```

use crate::error::ParseError;
use crate::types::{AuthenticationResponse, ValidationOutcome};

/// Parses a CAS 1.0 `/validate` body.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedResponse`] if the first line is neither
/// `yes` nor `no`, and [`ParseError::MissingElement`] if a `yes` carries no
/// username.
pub fn parse_v1(body: &str) -> Result<ValidationOutcome, ParseError> {
    if body == "no\n\n" {
        return Ok(ValidationOutcome::Rejected(None));
    }

    let mut lines = body.split('\n').map(|line| line.trim_end_matches('\r'));
    match lines.next().map(str::trim) {
        Some("no") => Ok(ValidationOutcome::Rejected(None)),
        Some("yes") => {
            let user = lines.next().map(str::trim).unwrap_or_default();
            if user.is_empty() {
                return Err(ParseError::MissingElement("user"));
            }
            Ok(ValidationOutcome::Authenticated(AuthenticationResponse::new(user)))
        }
        _ => Err(ParseError::UnexpectedResponse(truncate(body))),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(64).collect()
}
