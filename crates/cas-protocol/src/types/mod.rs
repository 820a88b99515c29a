//! Core CAS types.

mod logout;
mod response;
mod version;

pub use logout::*;
pub use response::*;
pub use version::*;
