// ── Record-to-domain conversions ──
//
// Bridges flat `rbwatch_api::Record` rows into typed `crate::model` values.
// Every conversion is fallible per row: a malformed row yields a
// `CoreError::Parse` that callers log and skip without discarding the rest
// of the batch.

use std::net::Ipv4Addr;

use rbwatch_api::Record;

use crate::error::CoreError;
use crate::model::{
    FlowSample, Lease, LocalNetwork, MacAddress, Queue, QueueLimits, Script, Variable,
};

// ── Helpers ────────────────────────────────────────────────────────

fn owned(record: &Record, key: &str) -> Option<String> {
    record.get_trimmed(key).map(str::to_owned)
}

fn required<'a>(record: &'a Record, entity: &'static str, key: &str) -> Result<&'a str, CoreError> {
    record
        .get_trimmed(key)
        .ok_or_else(|| CoreError::parse(entity, format!("missing '{key}'")))
}

fn ipv4(entity: &'static str, raw: &str) -> Result<Ipv4Addr, CoreError> {
    raw.parse()
        .map_err(|_| CoreError::parse(entity, format!("'{raw}' is not an IPv4 address")))
}

fn counter(record: &Record, entity: &'static str, key: &str) -> Result<u64, CoreError> {
    let raw = required(record, entity, key)?;
    raw.parse()
        .map_err(|_| CoreError::parse(entity, format!("'{key}' is not a counter: '{raw}'")))
}

// ── Leases ─────────────────────────────────────────────────────────

impl TryFrom<&Record> for Lease {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let address = ipv4("lease", required(record, "lease", "address")?)?;
        Ok(Self {
            address,
            comment: owned(record, "comment"),
            host_name: owned(record, "host-name"),
            mac_address: record.get_trimmed("mac-address").map(MacAddress::new),
            status: owned(record, "status"),
        })
    }
}

// ── Accounting snapshot rows ───────────────────────────────────────

impl TryFrom<&Record> for FlowSample {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            source: ipv4("flow", required(record, "flow", "src-address")?)?,
            destination: ipv4("flow", required(record, "flow", "dst-address")?)?,
            bytes: counter(record, "flow", "bytes")?,
            packets: counter(record, "flow", "packets")?,
        })
    }
}

// ── DHCP networks ──────────────────────────────────────────────────

impl TryFrom<&Record> for LocalNetwork {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        required(record, "dhcp network", "address")?
            .parse()
            .map_err(|e: crate::model::TargetParseError| CoreError::parse("dhcp network", e.to_string()))
    }
}

// ── Queues ─────────────────────────────────────────────────────────

impl TryFrom<&Record> for Queue {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let id = required(record, "queue", ".id")?.to_owned();
        let max_limit = match record.get_trimmed("max-limit") {
            Some(raw) => Some(
                raw.parse::<QueueLimits>()
                    .map_err(|reason| CoreError::parse("queue", reason))?,
            ),
            None => None,
        };
        Ok(Self {
            name: owned(record, "name").unwrap_or_else(|| id.clone()),
            id,
            target: owned(record, "target").unwrap_or_default(),
            max_limit,
            // Only an explicit `false` counts; an absent flag keeps the queue off.
            disabled: record.get_bool("disabled") != Some(false),
            invalid: record.get_bool("invalid") != Some(false),
        })
    }
}

// ── Scripts and variables ──────────────────────────────────────────

impl TryFrom<&Record> for Script {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required(record, "script", ".id")?.to_owned(),
            name: required(record, "script", "name")?.to_owned(),
            comment: owned(record, "comment"),
        })
    }
}

impl TryFrom<&Record> for Variable {
    type Error = CoreError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required(record, "variable", "name")?.to_owned(),
            value: record.get("value").unwrap_or_default().to_owned(),
        })
    }
}
