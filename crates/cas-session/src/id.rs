//! Session cookie value generation.

use rand::distr::{Alphanumeric, SampleString};

/// Length of generated session identifiers.
pub const SESSION_ID_LEN: usize = 32;

/// Generates a secure random session identifier.
///
/// 32 alphanumeric characters from the thread-local CSPRNG, roughly 190 bits
/// of entropy. The value is unrelated to any CAS ticket.
#[must_use]
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, SESSION_ID_LEN)
}
