//! Redirects to the CAS login and logout pages.

use axum::{
    http::{
        header::{LOCATION, SET_COOKIE},
        Extensions, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use cas_session::SessionError;
use url::Url;

use crate::context::CasContext;
use crate::cookie;

fn found(location: &Url) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location.as_str()) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

impl CasContext {
    /// Redirects to the CAS login page with this request as the callback.
    #[must_use]
    pub fn redirect_to_login(&self) -> Response {
        let url = self.client().login_url(self.service_url());
        tracing::debug!("Redirecting to {}", url);
        found(&url)
    }

    /// Drops the caller's local session, expires the session cookie and
    /// redirects to the CAS logout page with this request as the callback.
    pub async fn redirect_to_logout(&self) -> Response {
        let client = self.client();
        if let Some(cookie) = self.session_cookie() {
            match client.sessions().delete_by_cookie(cookie).await {
                Ok(_) | Err(SessionError::NotFound(_)) => {}
                Err(e) => {
                    client
                        .span()
                        .in_scope(|| tracing::warn!("Failed to drop local session: {}", e));
                }
            }
        }

        let url = client.logout_url(self.service_url());
        tracing::debug!("Redirecting to {}", url);
        let mut response = found(&url);
        if let Some(value) = cookie::header_value(&client.expired_session_cookie()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
        response
    }
}

/// Redirects the request to the CAS login page.
///
/// Responds `500` if the request never passed through the CAS middleware.
#[must_use]
pub fn redirect_to_login(extensions: &Extensions) -> Response {
    match CasContext::from_extensions(extensions) {
        Ok(ctx) => ctx.redirect_to_login(),
        Err(e) => e.into_response(),
    }
}

/// Logs the caller out locally and redirects to the CAS logout page.
///
/// Responds `500` if the request never passed through the CAS middleware.
pub async fn redirect_to_logout(extensions: &Extensions) -> Response {
    match CasContext::from_extensions(extensions) {
        Ok(ctx) => ctx.redirect_to_logout().await,
        Err(e) => e.into_response(),
    }
}
