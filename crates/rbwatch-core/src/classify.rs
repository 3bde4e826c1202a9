// ── Flow classification ──
//
// Decides, for each accounting row, which local address gets credited and
// under which traffic direction. The set of local networks is loaded once
// at startup and replaced wholesale; it is small, so membership is a
// linear scan.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::model::{LocalNetwork, TrafficType};

/// The networks considered local to the monitored premises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocalNetworks(Vec<LocalNetwork>);

/// Outcome of classifying one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowClass {
    /// Both ends local; each end is credited with the full count.
    Local {
        source: Ipv4Addr,
        destination: Ipv4Addr,
    },
    Upload(Ipv4Addr),
    Download(Ipv4Addr),
    /// Neither end local.
    Skip,
}

impl FlowClass {
    /// `(address, direction)` pairs this flow credits.
    pub fn credits(self) -> Vec<(Ipv4Addr, TrafficType)> {
        match self {
            Self::Local {
                source,
                destination,
            } => vec![(source, TrafficType::Local), (destination, TrafficType::Local)],
            Self::Upload(addr) => vec![(addr, TrafficType::Upload)],
            Self::Download(addr) => vec![(addr, TrafficType::Download)],
            Self::Skip => Vec::new(),
        }
    }

    pub fn traffic_type(self) -> Option<TrafficType> {
        match self {
            Self::Local { .. } => Some(TrafficType::Local),
            Self::Upload(_) => Some(TrafficType::Upload),
            Self::Download(_) => Some(TrafficType::Download),
            Self::Skip => None,
        }
    }
}

impl LocalNetworks {
    pub fn new(networks: Vec<LocalNetwork>) -> Self {
        Self(networks)
    }

    pub fn is_local(&self, address: Ipv4Addr) -> bool {
        self.0.iter().any(|net| net.contains(address))
    }

    pub fn classify_flow(&self, source: Ipv4Addr, destination: Ipv4Addr) -> FlowClass {
        match (self.is_local(source), self.is_local(destination)) {
            (true, true) => FlowClass::Local {
                source,
                destination,
            },
            (true, false) => FlowClass::Upload(source),
            (false, true) => FlowClass::Download(destination),
            (false, false) => FlowClass::Skip,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalNetwork> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<LocalNetwork> for LocalNetworks {
    fn from_iter<I: IntoIterator<Item = LocalNetwork>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
