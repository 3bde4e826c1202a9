// ── Local networks and monitored targets ──

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ip_network::Ipv4Network;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// An IPv4 CIDR block considered "inside" the monitored premises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalNetwork(Ipv4Network);

impl LocalNetwork {
    pub fn new(network: Ipv4Network) -> Self {
        Self(network)
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.0.contains(address)
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.0.network_address()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.netmask()
    }

    pub fn inner(&self) -> Ipv4Network {
        self.0
    }
}

impl fmt::Display for LocalNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for LocalNetwork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error returned for an unparsable address or CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address '{input}': {reason}")]
pub struct TargetParseError {
    pub input: String,
    pub reason: String,
}

impl TargetParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

impl FromStr for LocalNetwork {
    type Err = TargetParseError;

    /// Host bits are truncated, so `192.168.88.1/24` means `192.168.88.0/24`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (addr, prefix) = trimmed
            .split_once('/')
            .ok_or_else(|| TargetParseError::new(s, "missing prefix length"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| TargetParseError::new(s, "not an IPv4 address"))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| TargetParseError::new(s, "bad prefix length"))?;
        Ipv4Network::new_truncate(addr, prefix)
            .map(Self)
            .map_err(|e| TargetParseError::new(s, e.to_string()))
    }
}

// ── Target ──────────────────────────────────────────────────────────

/// A configured monitoring target: a single host or a whole network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Target {
    Host(Ipv4Addr),
    Network(LocalNetwork),
}

impl Target {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// `net` or `host`, as used in sensor identifiers.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Network(_) => "net",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(addr) => write!(f, "{addr}"),
            Self::Network(net) => write!(f, "{net}"),
        }
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.contains('/') {
            trimmed.parse().map(Self::Network)
        } else {
            trimmed
                .parse()
                .map(Self::Host)
                .map_err(|_| TargetParseError::new(s, "not an IPv4 address or network"))
        }
    }
}
