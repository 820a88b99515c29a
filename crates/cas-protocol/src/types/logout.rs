//! Single Logout notification.
//!
//! The CAS server POSTs a SAML-style `LogoutRequest` to every service that
//! holds a ticket when the user ends the SSO session. The only value that
//! matters to the client is the `SessionIndex`, which is the service ticket
//! the session was created from.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParseError;
use crate::parser::date::parse_timestamp;

/// Upper bound on the size of an accepted logout payload.
pub const MAX_LOGOUT_REQUEST_LEN: usize = 64 * 1024;

/// A parsed logout notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutNotification {
    /// Request identifier (`ID` attribute).
    pub id: Option<String>,
    /// When the CAS server issued the request.
    pub issue_instant: Option<DateTime<Utc>>,
    /// The principal the SSO session belonged to. CAS servers often send a
    /// placeholder here.
    pub name_id: Option<String>,
    /// The service ticket identifying the session to end.
    pub session_index: String,
}

impl LogoutNotification {
    /// Parses a `LogoutRequest` document.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the payload is too large, is not well
    /// formed, or carries no non-empty `SessionIndex`.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        if xml.len() > MAX_LOGOUT_REQUEST_LEN {
            return Err(ParseError::UnexpectedResponse(
                "logout request too large".to_string(),
            ));
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut saw_root = false;
        let mut id = None;
        let mut issue_instant = None;
        let mut name_id = None;
        let mut session_index = None;
        let mut current = String::new();
        let mut text = String::new();

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    if local == "LogoutRequest" {
                        saw_root = true;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr.unescape_value()?.to_string();
                            match attr.key.local_name().as_ref() {
                                b"ID" => id = Some(value),
                                b"IssueInstant" => issue_instant = parse_timestamp(&value),
                                _ => {}
                            }
                        }
                    }
                    current = local;
                    text.clear();
                }
                Ok(Event::Text(ref e)) => text.push_str(&e.unescape()?),
                Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
                Ok(Event::End(_)) => {
                    let value = std::mem::take(&mut text).trim().to_string();
                    match current.as_str() {
                        "NameID" => name_id = Some(value),
                        "SessionIndex" => session_index = Some(value),
                        _ => {}
                    }
                    current.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(ParseError::MissingElement("LogoutRequest"));
        }
        let session_index = session_index
            .filter(|s| !s.is_empty())
            .ok_or(ParseError::MissingElement("SessionIndex"))?;

        Ok(Self {
            id,
            issue_instant,
            name_id,
            session_index,
        })
    }
}
