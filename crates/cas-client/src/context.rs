//! Request-scoped CAS context.
//!
//! The middleware inserts one [`CasContext`] into every request it handles.
//! Handlers read it through the axum extractor or from the request
//! extensions; reading it from a request the middleware never saw is a
//! [`ClientError::NoClientBound`] error, not an anonymous user.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};
use cas_protocol::{Attributes, AuthenticationResponse};
use chrono::{DateTime, Utc};
use url::Url;

use crate::client::CasClient;
use crate::directory::{DirectoryService, Permission, Role, UserInfo};
use crate::error::{ClientError, ClientResult};

/// The client and, once resolved, the authenticated user bound to a
/// request.
#[derive(Debug, Clone)]
pub struct CasContext {
    client: CasClient,
    response: Option<Arc<AuthenticationResponse>>,
    session_cookie: Option<String>,
    service_url: Url,
}

impl CasContext {
    /// Creates a context for an unauthenticated request.
    #[must_use]
    pub fn new(client: CasClient, service_url: Url) -> Self {
        Self {
            client,
            response: None,
            session_cookie: None,
            service_url,
        }
    }

    /// Attaches the authenticated user and the cookie value of their
    /// session.
    #[must_use]
    pub fn with_session(
        mut self,
        response: Arc<AuthenticationResponse>,
        session_cookie: impl Into<String>,
    ) -> Self {
        self.response = Some(response);
        self.session_cookie = Some(session_cookie.into());
        self
    }

    /// Reads the context from request extensions.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoClientBound`] if the request did not pass
    /// through the CAS middleware.
    pub fn from_extensions(extensions: &Extensions) -> ClientResult<&Self> {
        extensions.get::<Self>().ok_or(ClientError::NoClientBound)
    }

    /// The client bound to this request.
    #[must_use]
    pub const fn client(&self) -> &CasClient {
        &self.client
    }

    /// Public URL of this request, without any ticket.
    #[must_use]
    pub const fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Cookie value of the caller's session, if authenticated.
    #[must_use]
    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// The full validation result, if authenticated.
    #[must_use]
    pub fn response(&self) -> Option<&AuthenticationResponse> {
        self.response.as_deref()
    }

    /// Whether the caller is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.response.is_some()
    }

    /// The principal, if authenticated.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.response().map(AuthenticationResponse::user)
    }

    /// Released attributes, if authenticated.
    #[must_use]
    pub fn attributes(&self) -> Option<&Attributes> {
        self.response().map(AuthenticationResponse::attributes)
    }

    /// When the user authenticated, if the server said.
    #[must_use]
    pub fn authentication_date(&self) -> Option<DateTime<Utc>> {
        self.response().and_then(AuthenticationResponse::authentication_date)
    }

    /// Whether the ticket followed a fresh login. `false` when unknown.
    #[must_use]
    pub fn is_new_login(&self) -> bool {
        self.response()
            .and_then(AuthenticationResponse::is_new_login)
            .unwrap_or(false)
    }

    /// Whether the login came from a remember-me token. `false` when
    /// unknown.
    #[must_use]
    pub fn is_remembered_login(&self) -> bool {
        self.response()
            .and_then(AuthenticationResponse::is_remembered_login)
            .unwrap_or(false)
    }

    /// Groups the user belongs to; empty when unauthenticated.
    #[must_use]
    pub fn member_of(&self) -> &[String] {
        match self.response() {
            Some(response) => response.member_of(),
            None => &[],
        }
    }

    /// The numeric user identifier from the `uid` attribute.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] without a user, and
    /// [`ClientError::Attribute`] if the attribute is missing or not an
    /// integer.
    pub fn user_id(&self) -> ClientResult<i64> {
        let response = self.response().ok_or(ClientError::NotAuthenticated)?;
        Ok(response.user_id()?)
    }

    fn directory(&self) -> ClientResult<&dyn DirectoryService> {
        self.client
            .directory()
            .map(|d| &**d)
            .ok_or(ClientError::DirectoryUnavailable)
    }

    /// Roles of the authenticated user.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`], [`ClientError::DirectoryUnavailable`]
    /// or the directory's own error.
    pub async fn roles(&self) -> ClientResult<Vec<Role>> {
        let principal = self.response().ok_or(ClientError::NotAuthenticated)?;
        self.directory()?.roles(principal).await
    }

    /// Permissions the authenticated user holds through `role_id`.
    ///
    /// # Errors
    ///
    /// As for [`roles`](Self::roles).
    pub async fn permissions(&self, role_id: i64) -> ClientResult<Vec<Permission>> {
        let principal = self.response().ok_or(ClientError::NotAuthenticated)?;
        self.directory()?.permissions(principal, role_id).await
    }

    /// Directory information for `user_id`.
    ///
    /// # Errors
    ///
    /// [`ClientError::DirectoryUnavailable`] or the directory's own error.
    pub async fn user_info(&self, user_id: i64) -> ClientResult<UserInfo> {
        self.directory()?.user_info(user_id).await
    }
}

impl<S> FromRequestParts<S> for CasContext
where
    S: Send + Sync,
{
    type Rejection = ClientError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&parts.extensions).cloned()
    }
}
