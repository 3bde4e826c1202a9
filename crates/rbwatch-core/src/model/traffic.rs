// ── Traffic direction and flow samples ──

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Direction of accumulated traffic relative to the local networks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrafficType {
    Local,
    Upload,
    Download,
}

/// What a monitored target reports: activity or one traffic direction.
///
/// `Active` is derived from lease state and never accumulated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SensorKind {
    Active,
    Download,
    Upload,
    Local,
}

impl SensorKind {
    pub fn traffic_type(self) -> Option<TrafficType> {
        match self {
            Self::Active => None,
            Self::Download => Some(TrafficType::Download),
            Self::Upload => Some(TrafficType::Upload),
            Self::Local => Some(TrafficType::Local),
        }
    }

    /// `Active` → `"Active"`, used in network sensor names.
    pub fn title(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Download => "Download",
            Self::Upload => "Upload",
            Self::Local => "Local",
        }
    }
}

/// One row of an accounting snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSample {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub bytes: u64,
    pub packets: u64,
}
