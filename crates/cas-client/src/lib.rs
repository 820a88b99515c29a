//! CAS single sign-on for axum applications.
//!
//! Wraps an application so that:
//!
//! - a request carrying a CAS service ticket is validated against the CAS
//!   server and, on success, gets a local session and a session cookie
//! - a request carrying a session cookie is bound to its session without
//!   contacting the CAS server
//! - Single Logout notifications from the CAS server drop the matching
//!   session
//!
//! Handlers see the outcome as a [`CasContext`] and decide for themselves
//! whether to serve anonymous users or send them to the login page.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use cas_client::{cas_middleware, CasClient, CasContext, ClientConfig};
//!
//! async fn me(ctx: CasContext) -> axum::response::Response {
//!     match ctx.user() {
//!         Some(user) => format!("hello {user}").into_response(),
//!         None => ctx.redirect_to_login(),
//!     }
//! }
//!
//! let client = CasClient::new(ClientConfig::from_env()?)?;
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(client, cas_middleware));
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod context;
pub mod cookie;
pub mod directory;
pub mod error;
pub mod logout;
pub mod middleware;
pub mod redirect;
pub mod service_url;

pub use client::{CasClient, CasClientBuilder};
pub use config::{ClientConfig, ValidationErrorPolicy};
pub use context::CasContext;
pub use directory::{DirectoryService, Permission, Role, UserInfo};
pub use error::{ClientError, ClientResult};
pub use middleware::cas_middleware;
pub use redirect::{redirect_to_login, redirect_to_logout};
