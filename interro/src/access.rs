use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How much an external editor may change a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// `ro`: may be critiqued, never improved.
    #[serde(rename = "ro")]
    ReadOnly,
    /// `rw`
    #[serde(rename = "rw")]
    ReadWrite,
    /// `w`
    #[serde(rename = "w")]
    Write,
}

/// The access tokens accepted in a block header, in declaration order.
pub const ACCESS_TOKENS: [&str; 3] = ["ro", "rw", "w"];

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::ReadOnly => "ro",
            Access::ReadWrite => "rw",
            Access::Write => "w",
        }
    }

    /// Whether the "improve" instruction may be formatted for this block.
    pub fn is_writable(self) -> bool {
        !matches!(self, Access::ReadOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized access token `{0}`, expected one of `ro`, `rw`, `w`")]
pub struct UnknownAccess(pub String);

impl FromStr for Access {
    type Err = UnknownAccess;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ro" => Ok(Access::ReadOnly),
            "rw" => Ok(Access::ReadWrite),
            "w" => Ok(Access::Write),
            other => Err(UnknownAccess(other.to_string())),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
