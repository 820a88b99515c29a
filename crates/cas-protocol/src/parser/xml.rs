//! CAS 2.0/3.0 XML responses.
//!
//! ```xml
//! <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
//!   <cas:authenticationSuccess>
//!     <cas:user>alice</cas:user>
//!     <cas:attributes>
//!       <cas:authenticationDate>2024-03-01T10:15:00Z</cas:authenticationDate>
//!       <cas:isFromNewLogin>true</cas:isFromNewLogin>
//!       <cas:memberOf>staff</cas:memberOf>
//!       <cas:uid>42</cas:uid>
//!     </cas:attributes>
//!   </cas:authenticationSuccess>
//! </cas:serviceResponse>
//! ```
//!
//! Elements are matched by local name so any namespace prefix is accepted.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::date::parse_timestamp;
use crate::error::ParseError;
use crate::types::{
    Attributes, AuthenticationFailure, AuthenticationResponse, ValidationOutcome,
};

const AUTHENTICATION_DATE: &str = "authenticationDate";
const NEW_LOGIN: &str = "isFromNewLogin";
const REMEMBERED_LOGIN: &str = "longTermAuthenticationRequestTokenUsed";
const MEMBER_OF: &str = "memberOf";

/// Parses a `/serviceValidate` or `/p3/serviceValidate` body.
///
/// # Errors
///
/// Returns a [`ParseError`] if the document is not well formed, contains
/// neither a success nor a failure block, or a success block lacks a user.
pub fn parse_service_response(body: &str) -> Result<ValidationOutcome, ParseError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut doc = ServiceResponseDoc::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e);
                doc.open(&local, e)?;
                stack.push(local);
                text.clear();
            }
            Ok(Event::Empty(ref e)) => {
                let local = local_name(e);
                doc.open(&local, e)?;
                if local == "attribute" && stack.last().map(String::as_str) == Some("attributes") {
                    doc.inline_attribute(e)?;
                }
            }
            Ok(Event::Text(ref e)) => text.push_str(&e.unescape()?),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Ok(Event::End(_)) => {
                let Some(local) = stack.pop() else {
                    return Err(ParseError::Xml("unbalanced end tag".to_string()));
                };
                let value = std::mem::take(&mut text).trim().to_string();
                doc.close(stack.last().map(String::as_str), &local, value)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    doc.finish()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Fields collected while walking the document.
#[derive(Default)]
struct ServiceResponseDoc {
    success: bool,
    failure: bool,
    failure_code: Option<String>,
    failure_message: String,
    user: Option<String>,
    proxy_granting_ticket: Option<String>,
    proxies: Vec<String>,
    attributes: Attributes,
    authentication_date: Option<chrono::DateTime<chrono::Utc>>,
    is_new_login: Option<bool>,
    is_remembered_login: Option<bool>,
    member_of: Vec<String>,
}

impl ServiceResponseDoc {
    fn open(&mut self, local: &str, e: &BytesStart<'_>) -> Result<(), ParseError> {
        match local {
            "authenticationSuccess" => self.success = true,
            "authenticationFailure" => {
                self.failure = true;
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.local_name().as_ref() == b"code" {
                        self.failure_code = Some(attr.unescape_value()?.trim().to_string());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, parent: Option<&str>, local: &str, value: String) -> Result<(), ParseError> {
        match (parent, local) {
            (_, "authenticationFailure") => self.failure_message = value,
            (Some("authenticationSuccess"), "user") => self.user = Some(value),
            (Some("authenticationSuccess"), "proxyGrantingTicket") => {
                self.proxy_granting_ticket = Some(value);
            }
            (Some("proxies"), "proxy") => self.proxies.push(value),
            (Some("attributes"), "attribute") => {}
            (Some("attributes"), name) => self.attribute(name, value)?,
            _ => {}
        }
        Ok(())
    }

    /// RubyCAS style: `<cas:attribute name="uid" value="42"/>`.
    fn inline_attribute(&mut self, e: &BytesStart<'_>) -> Result<(), ParseError> {
        let mut name = None;
        let mut value = None;
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"name" => name = Some(attr.unescape_value()?.to_string()),
                b"value" => value = Some(attr.unescape_value()?.to_string()),
                _ => {}
            }
        }
        match (name, value) {
            (Some(name), Some(value)) => self.attribute(&name, value),
            _ => Err(ParseError::MissingElement("attribute name/value")),
        }
    }

    fn attribute(&mut self, name: &str, value: String) -> Result<(), ParseError> {
        match name {
            AUTHENTICATION_DATE => {
                self.authentication_date = parse_timestamp(&value);
                if self.authentication_date.is_none() {
                    tracing::debug!("Ignoring unreadable authenticationDate {:?}", value);
                }
            }
            NEW_LOGIN => self.is_new_login = Some(parse_flag(name, &value)?),
            REMEMBERED_LOGIN => self.is_remembered_login = Some(parse_flag(name, &value)?),
            MEMBER_OF => self.member_of.push(value),
            _ => self.attributes.add(name, value),
        }
        Ok(())
    }

    fn finish(self) -> Result<ValidationOutcome, ParseError> {
        if self.success {
            let user = self
                .user
                .filter(|u| !u.is_empty())
                .ok_or(ParseError::MissingElement("user"))?;

            let mut response = AuthenticationResponse::new(user).with_attributes(self.attributes);
            if let Some(date) = self.authentication_date {
                response = response.with_authentication_date(date);
            }
            if let Some(is_new) = self.is_new_login {
                response = response.with_new_login(is_new);
            }
            if let Some(remembered) = self.is_remembered_login {
                response = response.with_remembered_login(remembered);
            }
            for group in self.member_of {
                response = response.with_member_of(group);
            }
            if let Some(pgt) = self.proxy_granting_ticket {
                response = response.with_proxy_granting_ticket(pgt);
            }
            for proxy in self.proxies {
                response = response.with_proxy(proxy);
            }
            return Ok(ValidationOutcome::Authenticated(response));
        }

        if self.failure {
            return Ok(ValidationOutcome::Rejected(Some(AuthenticationFailure::new(
                self.failure_code.unwrap_or_default(),
                self.failure_message,
            ))));
        }

        Err(ParseError::UnexpectedResponse(
            "no authenticationSuccess or authenticationFailure element".to_string(),
        ))
    }
}

fn parse_flag(element: &str, value: &str) -> Result<bool, ParseError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ParseError::InvalidValue {
            element: element.to_string(),
            value: value.to_string(),
        })
    }
}
