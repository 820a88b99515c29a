//! Validation results.
//!
//! [`AuthenticationResponse`] is the canonical form of a successful ticket
//! validation regardless of which protocol version produced it.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multi-valued user attributes released by the CAS server.
///
/// Values keep the order in which the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Vec<String>>);

impl Attributes {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the named attribute.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Returns all values of the named attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Returns the first value of the named attribute.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// Parses the first value of the named attribute as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Missing`] if the attribute is absent or has
    /// no values, and [`AttributeError::Conversion`] if the value does not
    /// parse as `T`.
    pub fn parse_first<T>(&self, name: &str) -> Result<T, AttributeError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self
            .first(name)
            .ok_or_else(|| AttributeError::Missing(name.to_string()))?;
        raw.trim().parse::<T>().map_err(|e| AttributeError::Conversion {
            name: name.to_string(),
            value: raw.to_string(),
            expected: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
    }

    /// Returns true if the named attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of distinct attribute names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over attribute names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.add(name, value);
        }
        attributes
    }
}

/// Typed attribute access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The attribute is not present.
    #[error("attribute not present: {0}")]
    Missing(String),

    /// The attribute value could not be converted.
    #[error("attribute {name} = {value:?} is not a valid {expected}: {reason}")]
    Conversion {
        /// Attribute name.
        name: String,
        /// Raw value.
        value: String,
        /// Name of the requested type.
        expected: &'static str,
        /// Conversion error text.
        reason: String,
    },
}

/// A successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    user: String,
    #[serde(default)]
    attributes: Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_new_login: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_remembered_login: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    member_of: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_granting_ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    proxies: Vec<String>,
}

impl AuthenticationResponse {
    /// Attribute carrying the numeric user identifier.
    pub const USER_ID_ATTRIBUTE: &'static str = "uid";

    /// Creates a response for the given principal with no metadata.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            attributes: Attributes::new(),
            authentication_date: None,
            is_new_login: None,
            is_remembered_login: None,
            member_of: Vec::new(),
            proxy_granting_ticket: None,
            proxies: Vec::new(),
        }
    }

    /// Sets the attribute map.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the authentication date.
    #[must_use]
    pub fn with_authentication_date(mut self, date: DateTime<Utc>) -> Self {
        self.authentication_date = Some(date);
        self
    }

    /// Sets the new-login flag.
    #[must_use]
    pub fn with_new_login(mut self, is_new: bool) -> Self {
        self.is_new_login = Some(is_new);
        self
    }

    /// Sets the remembered-login flag.
    #[must_use]
    pub fn with_remembered_login(mut self, remembered: bool) -> Self {
        self.is_remembered_login = Some(remembered);
        self
    }

    /// Adds a group membership.
    #[must_use]
    pub fn with_member_of(mut self, group: impl Into<String>) -> Self {
        self.member_of.push(group.into());
        self
    }

    /// Sets the proxy granting ticket IOU.
    #[must_use]
    pub fn with_proxy_granting_ticket(mut self, pgt: impl Into<String>) -> Self {
        self.proxy_granting_ticket = Some(pgt.into());
        self
    }

    /// Adds a proxy to the proxy chain.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxies.push(proxy.into());
        self
    }

    /// The authenticated principal.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Released attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// When the user authenticated. `None` under CAS 1.0/2.0 or when the
    /// server sent a date that could not be read.
    #[must_use]
    pub const fn authentication_date(&self) -> Option<DateTime<Utc>> {
        self.authentication_date
    }

    /// Whether the ticket followed a fresh authentication.
    #[must_use]
    pub const fn is_new_login(&self) -> Option<bool> {
        self.is_new_login
    }

    /// Whether the ticket was granted from a long-term (remember-me) token.
    #[must_use]
    pub const fn is_remembered_login(&self) -> Option<bool> {
        self.is_remembered_login
    }

    /// Groups the user belongs to.
    #[must_use]
    pub fn member_of(&self) -> &[String] {
        &self.member_of
    }

    /// The proxy granting ticket IOU, if one was issued.
    #[must_use]
    pub fn proxy_granting_ticket(&self) -> Option<&str> {
        self.proxy_granting_ticket.as_deref()
    }

    /// Proxies the ticket passed through, outermost first.
    #[must_use]
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    /// The numeric user identifier from the `uid` attribute.
    ///
    /// # Errors
    ///
    /// Fails if the attribute is missing or is not an integer.
    pub fn user_id(&self) -> Result<i64, AttributeError> {
        self.attributes.parse_first(Self::USER_ID_ATTRIBUTE)
    }
}

/// A well-formed rejection from the CAS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationFailure {
    /// Error code, e.g. `INVALID_TICKET`.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

impl AuthenticationFailure {
    /// Creates a failure with the given code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The protocol-level answer to a validation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The ticket was valid.
    Authenticated(AuthenticationResponse),
    /// The ticket was not valid. CAS 1.0 carries no failure detail.
    Rejected(Option<AuthenticationFailure>),
}

impl ValidationOutcome {
    /// Returns the response if the ticket was valid.
    #[must_use]
    pub fn into_response(self) -> Option<AuthenticationResponse> {
        match self {
            Self::Authenticated(response) => Some(response),
            Self::Rejected(_) => None,
        }
    }

    /// Returns true if the ticket was valid.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
