// ── Traffic accounting aggregator ──
//
// Holds the byte and packet counters of exactly one snapshot interval,
// keyed by (local address, direction), plus the measured length of that
// interval. Counters are cleared at the start of every cycle; they never
// span more than one interval.
//
// Rate queries come in two layers: `*_per_second` returns `None` when there
// is nothing to report (no entry, no valid interval), and the `rate_*`
// display methods collapse that to zero.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use rbwatch_api::Record;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::classify::LocalNetworks;
use crate::model::{FlowSample, LocalNetwork, TrafficType};
use crate::units::TrafficUnit;

type CounterKey = (Ipv4Addr, TrafficType);

/// Per-interval traffic counters and rate queries.
#[derive(Debug, Clone, Default)]
pub struct TrafficAccounting {
    bytes: HashMap<CounterKey, u64>,
    packets: HashMap<CounterKey, u64>,
    interval: Option<Duration>,
    unit: TrafficUnit,
}

/// Row counts from one [`TrafficAccounting::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows: usize,
    pub credited: usize,
    pub foreign: usize,
    pub malformed: usize,
}

impl TrafficAccounting {
    pub fn new(unit: TrafficUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn unit(&self) -> TrafficUnit {
        self.unit
    }

    // ── Accumulation ────────────────────────────────────────────────

    /// Forget all counters. Call before feeding a new snapshot.
    pub fn begin_cycle(&mut self) {
        self.bytes.clear();
        self.packets.clear();
    }

    /// Add one credit. Zero counts leave no entry behind; sums saturate.
    pub fn record(&mut self, address: Ipv4Addr, traffic: TrafficType, bytes: u64, packets: u64) {
        if bytes > 0 {
            let entry = self.bytes.entry((address, traffic)).or_default();
            *entry = entry.saturating_add(bytes);
        }
        if packets > 0 {
            let entry = self.packets.entry((address, traffic)).or_default();
            *entry = entry.saturating_add(packets);
        }
    }

    /// Store the gap since the previous snapshot. Zero or unknown disables rates.
    pub fn set_interval(&mut self, interval: Option<Duration>) {
        self.interval = interval.filter(|d| !d.is_zero());
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Clear the counters, then classify and credit every snapshot row.
    ///
    /// Rows that fail to parse (missing fields, IPv6 addresses) are skipped
    /// individually.
    pub fn ingest(&mut self, networks: &LocalNetworks, rows: &[Record]) -> IngestSummary {
        self.begin_cycle();
        let mut summary = IngestSummary {
            rows: rows.len(),
            ..IngestSummary::default()
        };

        for row in rows {
            let flow = match FlowSample::try_from(row) {
                Ok(flow) => flow,
                Err(e) => {
                    debug!(error = %e, "skipping accounting row");
                    summary.malformed += 1;
                    continue;
                }
            };

            let credits = networks.classify_flow(flow.source, flow.destination).credits();
            if credits.is_empty() {
                debug!(src = %flow.source, dst = %flow.destination, "skipping non-local flow");
                summary.foreign += 1;
                continue;
            }
            for (address, traffic) in credits {
                self.record(address, traffic, flow.bytes, flow.packets);
            }
            summary.credited += 1;
        }

        if summary.malformed > 0 {
            warn!(malformed = summary.malformed, "skipped malformed accounting rows");
        }
        summary
    }

    // ── Raw counters ────────────────────────────────────────────────

    pub fn byte_count(&self, address: Ipv4Addr, traffic: TrafficType) -> Option<u64> {
        self.bytes.get(&(address, traffic)).copied()
    }

    pub fn packet_count(&self, address: Ipv4Addr, traffic: TrafficType) -> Option<u64> {
        self.packets.get(&(address, traffic)).copied()
    }

    /// Addresses with at least one counter this interval.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        let mut seen: Vec<Ipv4Addr> = self
            .bytes
            .keys()
            .chain(self.packets.keys())
            .map(|(addr, _)| *addr)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.into_iter()
    }

    // ── Per-second values ───────────────────────────────────────────

    pub fn bytes_per_second(&self, address: Ipv4Addr, traffic: TrafficType) -> Option<u64> {
        per_second(self.byte_count(address, traffic)?, self.interval?)
    }

    pub fn packets_per_second(&self, address: Ipv4Addr, traffic: TrafficType) -> Option<u64> {
        per_second(self.packet_count(address, traffic)?, self.interval?)
    }

    /// Summed byte rate of the members that fall inside `network`.
    pub fn network_bytes_per_second(
        &self,
        network: &LocalNetwork,
        traffic: TrafficType,
        members: impl IntoIterator<Item = Ipv4Addr>,
    ) -> Option<u64> {
        let total = sum_members(&self.bytes, network, traffic, members);
        per_second(total, self.interval?)
    }

    pub fn network_packets_per_second(
        &self,
        network: &LocalNetwork,
        traffic: TrafficType,
        members: impl IntoIterator<Item = Ipv4Addr>,
    ) -> Option<u64> {
        let total = sum_members(&self.packets, network, traffic, members);
        per_second(total, self.interval?)
    }

    // ── Display rates ───────────────────────────────────────────────

    /// Byte rate in the configured unit; 0 when there is nothing to report.
    pub fn rate_bytes(&self, address: Ipv4Addr, traffic: TrafficType) -> f64 {
        self.unit
            .convert(self.bytes_per_second(address, traffic).unwrap_or(0))
    }

    pub fn rate_packets(&self, address: Ipv4Addr, traffic: TrafficType) -> u64 {
        self.packets_per_second(address, traffic).unwrap_or(0)
    }

    pub fn network_rate_bytes(
        &self,
        network: &LocalNetwork,
        traffic: TrafficType,
        members: impl IntoIterator<Item = Ipv4Addr>,
    ) -> f64 {
        self.unit.convert(
            self.network_bytes_per_second(network, traffic, members)
                .unwrap_or(0),
        )
    }

    pub fn network_rate_packets(
        &self,
        network: &LocalNetwork,
        traffic: TrafficType,
        members: impl IntoIterator<Item = Ipv4Addr>,
    ) -> u64 {
        self.network_packets_per_second(network, traffic, members)
            .unwrap_or(0)
    }
}

fn sum_members(
    counters: &HashMap<CounterKey, u64>,
    network: &LocalNetwork,
    traffic: TrafficType,
    members: impl IntoIterator<Item = Ipv4Addr>,
) -> u64 {
    members
        .into_iter()
        .filter(|addr| network.contains(*addr))
        .filter_map(|addr| counters.get(&(addr, traffic)))
        .fold(0_u64, |acc, n| acc.saturating_add(*n))
}

/// `round(count / interval)` with half-to-even rounding.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn per_second(count: u64, interval: Duration) -> Option<u64> {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    Some((count as f64 / secs).round_ties_even() as u64)
}

// ── Snapshot clock ──────────────────────────────────────────────────

/// Measures the gap between consecutive snapshot-take calls.
///
/// The first mark has nothing to measure against and yields `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotClock {
    last_take: Option<Instant>,
}

impl SnapshotClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a take now and return the elapsed time since the previous one.
    pub fn mark(&mut self) -> Option<Duration> {
        let now = Instant::now();
        let elapsed = self.last_take.map(|prev| now.duration_since(prev));
        self.last_take = Some(now);
        elapsed
    }

    pub fn last_take(&self) -> Option<Instant> {
        self.last_take
    }
}
