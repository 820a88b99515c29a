//! CAS protocol versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The CAS protocol generation used for ticket validation.
///
/// Each variant owns one validation endpoint and one response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// CAS 1.0: `/validate`, plain-text `yes`/`no` body.
    #[serde(rename = "CAS1")]
    V1,
    /// CAS 2.0: `/serviceValidate`, XML body.
    #[serde(rename = "CAS2")]
    V2,
    /// CAS 3.0: `/p3/serviceValidate`, XML body with an attribute block.
    #[default]
    #[serde(rename = "CAS3")]
    V3,
}

impl ProtocolVersion {
    /// Path of the validation endpoint, relative to the CAS base URL.
    #[must_use]
    pub const fn validation_path(self) -> &'static str {
        match self {
            Self::V1 => "validate",
            Self::V2 => "serviceValidate",
            Self::V3 => "p3/serviceValidate",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("CAS1"),
            Self::V2 => f.write_str("CAS2"),
            Self::V3 => f.write_str("CAS3"),
        }
    }
}

/// Error returned when a protocol version string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown CAS protocol version: {0}")]
pub struct UnknownProtocolVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = UnknownProtocolVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAS1" | "1" => Ok(Self::V1),
            "CAS2" | "2" => Ok(Self::V2),
            "CAS3" | "3" => Ok(Self::V3),
            _ => Err(UnknownProtocolVersion(s.to_string())),
        }
    }
}
