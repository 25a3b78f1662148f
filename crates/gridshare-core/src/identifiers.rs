//! Principal identifiers
//!
//! A principal is whoever signs an operation: a producer, a consumer, or the
//! ledger owner. The ledger treats it as an opaque key and never interprets
//! its contents.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a ledger participant
///
/// Wraps the participant's address string (for example `wallet_1` or a
/// `ST...` account address). Ordering is lexicographic so tables keyed by
/// principal iterate deterministically. The default is the empty address,
/// which configuration validation rejects. Deserialization goes through
/// [`FromStr`], so decoded addresses are trimmed and never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Create a principal from an address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the underlying address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is empty (never a valid participant)
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing a blank principal address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("principal address must not be empty")]
pub struct EmptyPrincipal;

impl FromStr for PrincipalId {
    type Err = EmptyPrincipal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmptyPrincipal);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for PrincipalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let address = String::deserialize(deserializer)?;
        address.parse().map_err(serde::de::Error::custom)
    }
}

impl From<String> for PrincipalId {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for PrincipalId {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl AsRef<str> for PrincipalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
