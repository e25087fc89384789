use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DispatchError;

/// Privilege level. Lower is more privileged.
///
/// `Nobody` only makes sense as a requirement: a binding that requires it is
/// unreachable. `Anybody` is what every unknown user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Nobody = 0,
    Admin = 1,
    Whitelisted = 2,
    Anybody = 3,
}

impl Rank {
    pub fn level(self) -> i16 {
        self as i16
    }

    /// Decode a persisted level. A stored `Nobody` is read back as `Anybody`.
    pub fn from_level(level: i16) -> Result<Self, DispatchError> {
        match level {
            0 | 3 => Ok(Rank::Anybody),
            1 => Ok(Rank::Admin),
            2 => Ok(Rank::Whitelisted),
            other => Err(DispatchError::InvalidRank(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Nobody => "nobody",
            Rank::Admin => "admin",
            Rank::Whitelisted => "whitelisted",
            Rank::Anybody => "anybody",
        }
    }
}

impl TryFrom<i16> for Rank {
    type Error = DispatchError;

    fn try_from(level: i16) -> Result<Self, Self::Error> {
        Rank::from_level(level)
    }
}

impl FromStr for Rank {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nobody" => Ok(Rank::Nobody),
            "admin" => Ok(Rank::Admin),
            "whitelisted" | "whitelist" => Ok(Rank::Whitelisted),
            "anybody" | "everyone" => Ok(Rank::Anybody),
            other => Err(DispatchError::InvalidRank(other.to_string())),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
