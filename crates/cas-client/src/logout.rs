//! Single Logout.
//!
//! The CAS server announces a logout by POSTing a form with a
//! `logoutRequest` field holding a SAML `LogoutRequest`. Its `SessionIndex`
//! is the service ticket the session was created from.

use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::client::CasClient;

/// Form field carrying the logout notification.
pub const LOGOUT_REQUEST_FIELD: &str = "logoutRequest";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Checks whether the request body is a URL-encoded form.
///
/// Parameters such as `charset` are ignored.
#[must_use]
pub fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

/// Checks whether a request could carry a logout notification, before its
/// body is read.
#[must_use]
pub fn may_carry_logout(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::POST && is_form_urlencoded(headers)
}

/// The `logoutRequest` payload of a decoded form, if present and non-empty.
#[must_use]
pub fn logout_payload(form: &[(String, String)]) -> Option<&str> {
    form.iter()
        .find(|(key, _)| key == LOGOUT_REQUEST_FIELD)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.trim().is_empty())
}

/// Checks whether a request is a Single Logout notification.
#[must_use]
pub fn is_logout_request(method: &Method, headers: &HeaderMap, form: &[(String, String)]) -> bool {
    may_carry_logout(method, headers) && logout_payload(form).is_some()
}

/// Processes a logout notification and builds the reply for the CAS
/// server: `200 OK` once the session is gone, `500` with the error text
/// otherwise.
pub async fn handle_logout_request(client: &CasClient, payload: &str) -> Response {
    match client.process_logout(payload).await {
        Ok(session) => {
            client.span().in_scope(|| {
                tracing::info!("Single logout for {}", session.response().user());
            });
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => {
            client
                .span()
                .in_scope(|| tracing::warn!("Single logout failed: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
