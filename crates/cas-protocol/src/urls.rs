//! CAS endpoint URL construction.
//!
//! Endpoints are joined onto the configured CAS base URL so a server mounted
//! under a path prefix (`https://sso.example.com/cas`) keeps that prefix.

use url::Url;

use crate::error::{CasError, CasResult};
use crate::types::ProtocolVersion;

/// Query parameter carrying the service ticket.
pub const TICKET_PARAM: &str = "ticket";

/// Query parameter carrying the callback URL.
pub const SERVICE_PARAM: &str = "service";

/// Joins `path` onto the path of `base`.
///
/// # Errors
///
/// Returns [`CasError::InvalidUrl`] if `base` cannot carry a path
/// (e.g. a `mailto:` URL).
pub fn endpoint_url(base: &Url, path: &str) -> CasResult<Url> {
    let mut url = base.clone();
    url.set_fragment(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| CasError::InvalidUrl(format!("{base} cannot be a base URL")))?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}

/// Returns the service URL with every `ticket` query parameter removed.
///
/// The ticket travels in its own parameter on validation requests, and the
/// CAS server compares the service string against the one the ticket was
/// issued for.
#[must_use]
pub fn sanitised_service_url(service: &Url) -> Url {
    let mut url = service.clone();
    if !url.query_pairs().any(|(k, _)| k == TICKET_PARAM) {
        return url;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != TICKET_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}

/// Builds the validation URL for `version`.
///
/// # Errors
///
/// Returns [`CasError::InvalidUrl`] if the CAS URL cannot be a base.
pub fn validate_url(
    version: ProtocolVersion,
    cas_url: &Url,
    service: &Url,
    ticket: &str,
) -> CasResult<Url> {
    let mut url = endpoint_url(cas_url, version.validation_path())?;
    url.query_pairs_mut()
        .append_pair(SERVICE_PARAM, sanitised_service_url(service).as_str())
        .append_pair(TICKET_PARAM, ticket);
    Ok(url)
}

/// CAS 1.0 `/validate` URL.
///
/// # Errors
///
/// See [`validate_url`].
pub fn validate_url_v1(cas_url: &Url, service: &Url, ticket: &str) -> CasResult<Url> {
    validate_url(ProtocolVersion::V1, cas_url, service, ticket)
}

/// CAS 2.0 `/serviceValidate` URL.
///
/// # Errors
///
/// See [`validate_url`].
pub fn service_validate_url(cas_url: &Url, service: &Url, ticket: &str) -> CasResult<Url> {
    validate_url(ProtocolVersion::V2, cas_url, service, ticket)
}

/// CAS 3.0 `/p3/serviceValidate` URL.
///
/// # Errors
///
/// See [`validate_url`].
pub fn validate_url_v3(cas_url: &Url, service: &Url, ticket: &str) -> CasResult<Url> {
    validate_url(ProtocolVersion::V3, cas_url, service, ticket)
}

/// `{login}?service=<callback>`.
#[must_use]
pub fn login_url(login: &Url, service: &Url) -> Url {
    with_service(login, service)
}

/// `{logout}?service=<callback>`.
#[must_use]
pub fn logout_url(logout: &Url, service: &Url) -> Url {
    with_service(logout, service)
}

fn with_service(endpoint: &Url, service: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair(SERVICE_PARAM, sanitised_service_url(service).as_str());
    url
}
