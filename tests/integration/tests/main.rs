//! End-to-end tests.
//!
//! These tests run the CAS client against an in-process mock CAS server
//! listening on a random local port.

mod session_flow;
mod single_logout;
mod validation;
