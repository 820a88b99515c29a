//! Session cookie encoding.
//!
//! The cookie value is an opaque session identifier generated by this
//! client; it is never the CAS ticket. Cookies are `HttpOnly`, scoped to `/`
//! and `SameSite=Lax` so the redirect back from the CAS server still
//! carries them.

use std::time::Duration;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

/// Builds the `Set-Cookie` value for a new session.
#[must_use]
pub fn session_cookie(name: &str, value: &str, secure: bool, max_age: Duration) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{name}={value}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={}",
        max_age.as_secs()
    )
}

/// Builds the `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn expired_session_cookie(name: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age=0")
}

/// Converts a cookie string to a header value.
///
/// Returns `None` if the name or value holds characters a header cannot
/// carry.
#[must_use]
pub fn header_value(cookie: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(cookie).ok()
}

/// Finds the named cookie in the request's `Cookie` headers.
///
/// Empty values count as absent.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}
