use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::units::convert_bits_rate;

/// Upload/download bandwidth caps of a simple queue, in bits per second.
///
/// RouterOS prints them as `"upload/download"`, e.g. `"10000000/50000000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueueLimits {
    pub upload: u64,
    pub download: u64,
}

impl QueueLimits {
    pub fn upload_display(&self) -> String {
        convert_bits_rate(self.upload)
    }

    pub fn download_display(&self) -> String {
        convert_bits_rate(self.download)
    }
}

impl FromStr for QueueLimits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (up, down) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("expected 'upload/download', got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| format!("bad limit '{v}': {e}"))
        };
        Ok(Self {
            upload: parse(up)?,
            download: parse(down)?,
        })
    }
}

impl fmt::Display for QueueLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.upload, self.download)
    }
}

/// A simple queue (bandwidth shaper rule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Queue {
    pub id: String,
    pub name: String,
    /// Raw comma-separated target list as the router reports it.
    pub target: String,
    pub max_limit: Option<QueueLimits>,
    pub disabled: bool,
    pub invalid: bool,
}

impl Queue {
    /// A queue is on when it is neither disabled nor invalid.
    pub fn is_enabled(&self) -> bool {
        !self.invalid && !self.disabled
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.target.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Target list re-joined for display.
    pub fn target_display(&self) -> String {
        self.targets().collect::<Vec<_>>().join(", ")
    }
}
