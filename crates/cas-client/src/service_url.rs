//! Service URL resolution.
//!
//! The service URL is the callback the CAS server redirects back to and the
//! value a ticket is bound to, so it must be the URL the browser sees, not
//! the one this process was addressed with behind a proxy.

use axum::http::{header::HOST, HeaderMap, Uri};
use cas_protocol::urls::sanitised_service_url;
use url::Url;

use crate::error::{ClientError, ClientResult};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Resolves the public URL of the current request, without any `ticket`
/// query parameter.
///
/// With a configured public base, its scheme and authority are used.
/// Otherwise they come from `X-Forwarded-Proto`/`X-Forwarded-Host`, then
/// the `Host` header, then the request URI itself.
///
/// # Errors
///
/// Returns [`ClientError::ServiceUrl`] if no host can be determined or the
/// result is not a valid URL.
pub fn request_service_url(
    headers: &HeaderMap,
    uri: &Uri,
    public_base: Option<&Url>,
) -> ClientResult<Url> {
    let url = match public_base {
        Some(base) => {
            // Only the path and query come from the request; a `//host` path
            // must not replace the configured authority.
            let mut url = base.clone();
            url.set_fragment(None);
            url.set_path(uri.path());
            url.set_query(uri.query());
            url
        }
        None => {
            let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
            let scheme = first_value(headers, X_FORWARDED_PROTO)
                .or_else(|| uri.scheme_str())
                .unwrap_or("http");
            let host = first_value(headers, X_FORWARDED_HOST)
                .or_else(|| first_value(headers, HOST.as_str()))
                .or_else(|| uri.authority().map(|a| a.as_str()))
                .ok_or_else(|| ClientError::ServiceUrl("request has no host".to_string()))?;

            Url::parse(&format!("{scheme}://{host}{path_and_query}"))
                .map_err(|e| ClientError::ServiceUrl(e.to_string()))?
        }
    };

    Ok(sanitised_service_url(&url))
}

/// First comma-separated value of a header, for proxy chains.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|v| !v.is_empty())
}
