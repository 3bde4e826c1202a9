use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC address, normalized to upper-case colon-separated form (AA:BB:CC:DD:EE:FF).
///
/// RouterOS prints MACs upper-case; normalizing to the same case keeps
/// lookups and display consistent with what the router shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Placeholder reported for addresses with no known hardware address.
    pub const ZERO: &'static str = "00:00:00:00:00:00";

    /// Accepts colon-separated or dash-separated input in any case.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase().replace('-', ":"))
    }

    pub fn zero() -> Self {
        Self(Self::ZERO.to_owned())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
