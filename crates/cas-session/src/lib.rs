//! Session storage for the CAS client.
//!
//! Once a service ticket validates, the client keeps the result in a local
//! [`Session`] bound to a random cookie value, so later requests carrying
//! that cookie skip the round trip to the CAS server. Each session is also
//! indexed by the ticket that produced it, which is how Single Logout finds
//! the session to drop.
//!
//! # Architecture
//!
//! - [`store`] - the [`SessionStore`] trait and its in-memory implementation
//! - [`handle`] - shared, snapshot-able views onto a store
//! - [`sweeper`] - optional background eviction of stale sessions
//! - [`id`] - cookie value generation

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod handle;
pub mod id;
pub mod session;
pub mod store;
pub mod sweeper;

pub use error::{SessionError, SessionResult};
pub use handle::SessionStoreHandle;
pub use id::generate_session_id;
pub use session::Session;
pub use store::{InMemorySessionStore, SessionKey, SessionStore};
pub use sweeper::spawn_session_sweeper;
