//! Axum middleware binding CAS state to requests.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(client.clone(), cas_middleware));
//! ```

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::SET_COOKIE, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cas_protocol::urls::TICKET_PARAM;

use crate::client::CasClient;
use crate::config::ValidationErrorPolicy;
use crate::context::CasContext;
use crate::cookie;
use crate::logout::{handle_logout_request, is_logout_request, logout_payload, may_carry_logout};
use crate::service_url::request_service_url;

/// Largest URL-encoded form body buffered while looking for a logout
/// notification.
pub const MAX_FORM_BODY_LEN: usize = 1024 * 1024;

/// CAS middleware.
///
/// Answers Single Logout notifications directly. Every other request gets a
/// [`CasContext`]: the session named by the cookie if it is still live,
/// otherwise a new session if the request carries a ticket the CAS server
/// accepts. Handlers decide what an unauthenticated request may do.
pub async fn cas_middleware(State(client): State<CasClient>, request: Request, next: Next) -> Response {
    let request = if may_carry_logout(request.method(), request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_FORM_BODY_LEN).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, format!("cas: failed to read form body: {e}"))
                    .into_response();
            }
        };

        let form: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).unwrap_or_default();
        if is_logout_request(&parts.method, &parts.headers, &form) {
            let payload = logout_payload(&form).unwrap_or_default();
            return handle_logout_request(&client, payload).await;
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    bind_context(client, request, next).await
}

async fn bind_context(client: CasClient, mut request: Request, next: Next) -> Response {
    let config = client.config();
    let service_url = match request_service_url(
        request.headers(),
        request.uri(),
        config.service_url.as_ref(),
    ) {
        Ok(url) => url,
        Err(e) => return e.into_response(),
    };

    let presented = cookie::extract_cookie(request.headers(), &config.cookie_name).map(str::to_owned);
    let mut context = CasContext::new(client.clone(), service_url.clone());
    let mut set_cookie = None;

    if let Some(cookie) = presented.as_deref() {
        match client.resolve_session(cookie).await {
            Ok(Some(session)) => {
                tracing::debug!("Resolved session for {}", session.response().user());
                context = context.with_session(session.response_arc(), cookie);
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    if !context.is_authenticated() {
        if let Some(ticket) = ticket_param(request.uri()) {
            match client.establish_session(&service_url, &ticket).await {
                Ok(Some(session)) => {
                    set_cookie = Some(client.session_cookie(session.cookie()));
                    context = context.with_session(session.response_arc(), session.cookie());
                }
                Ok(None) => {}
                Err(e) => {
                    client
                        .span()
                        .in_scope(|| tracing::warn!("Ticket validation failed: {}", e));
                    if config.on_validation_error == ValidationErrorPolicy::Reject {
                        return e.into_response();
                    }
                }
            }
        }
    }

    // The browser still holds a cookie for a session that is gone.
    if set_cookie.is_none() && presented.is_some() && !context.is_authenticated() {
        set_cookie = Some(client.expired_session_cookie());
    }

    request.extensions_mut().insert(context);
    let mut response = next.run(request).await;

    if let Some(value) = set_cookie.as_deref().and_then(cookie::header_value) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// The first non-empty `ticket` query parameter.
fn ticket_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(key, value)| key == TICKET_PARAM && !value.is_empty())
        .map(|(_, value)| value)
}
