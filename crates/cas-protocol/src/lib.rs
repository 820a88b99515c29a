//! CAS protocol client core.
//!
//! This crate implements the wire side of the Central Authentication Service
//! protocol, versions 1.0, 2.0 and 3.0:
//!
//! - **Validation URLs** - endpoint selection and service URL sanitising
//! - **Ticket validation** - the server-to-server call that exchanges a
//!   service ticket for the user's identity
//! - **Response parsing** - plain-text (1.0) and XML (2.0/3.0) responses
//! - **Single Logout** - parsing of logout notifications sent by the server
//!
//! # Architecture
//!
//! - [`types`] - protocol versions, validation results, logout notifications
//! - [`parser`] - response body decoding
//! - [`urls`] - endpoint URL construction
//! - [`validator`] - HTTP validation client
//! - [`error`] - error types
//!
//! # Example
//!
//! ```rust,ignore
//! use cas_protocol::{ProtocolVersion, ServiceTicketValidator, ValidationOutcome};
//!
//! let validator = ServiceTicketValidator::new(cas_url, ProtocolVersion::V3)?;
//! match validator.validate(&service_url, "ST-123").await? {
//!     ValidationOutcome::Authenticated(response) => println!("hello {}", response.user()),
//!     ValidationOutcome::Rejected(_) => println!("ticket not valid"),
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod parser;
pub mod types;
pub mod urls;
pub mod validator;

pub use error::{CasError, CasResult, ParseError};
pub use parser::parse_response;
pub use types::*;
pub use validator::ServiceTicketValidator;
