// ── Published router state ──
//
// Each completed pass is frozen into an immutable `RouterSnapshot` and
// published through a `watch` channel. Readers only ever see a finished
// pass; they never touch the orchestrator's working state.

use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{HostRegistry, QueueRegistry, ScriptRegistry, VariableRegistry};
use crate::accounting::TrafficAccounting;
use crate::classify::LocalNetworks;
use crate::model::{LocalNetwork, TrafficType};
use crate::refresh::PassReport;
use crate::stream::SnapshotStream;
use crate::units::TrafficUnit;

/// Everything known after one refresh pass.
#[derive(Debug, Clone, Default)]
pub struct RouterSnapshot {
    /// Increases by one per published pass; 0 means nothing published yet.
    pub version: u64,
    pub taken_at: Option<DateTime<Utc>>,
    /// False when any stage failed in the pass's final attempt.
    pub available: bool,
    pub networks: Arc<LocalNetworks>,
    pub hosts: Arc<HostRegistry>,
    pub queues: Arc<QueueRegistry>,
    pub variables: Arc<VariableRegistry>,
    pub scripts: Arc<ScriptRegistry>,
    pub accounting: Arc<TrafficAccounting>,
    pub report: Option<PassReport>,
}

impl RouterSnapshot {
    pub fn unit(&self) -> TrafficUnit {
        self.accounting.unit()
    }

    pub fn rate_bytes(&self, address: Ipv4Addr, traffic: TrafficType) -> f64 {
        self.accounting.rate_bytes(address, traffic)
    }

    pub fn rate_packets(&self, address: Ipv4Addr, traffic: TrafficType) -> u64 {
        self.accounting.rate_packets(address, traffic)
    }

    /// Summed over the hosts currently leased inside `network`.
    pub fn network_rate_bytes(&self, network: &LocalNetwork, traffic: TrafficType) -> f64 {
        self.accounting
            .network_rate_bytes(network, traffic, self.hosts.hosts_in(network))
    }

    pub fn network_rate_packets(&self, network: &LocalNetwork, traffic: TrafficType) -> u64 {
        self.accounting
            .network_rate_packets(network, traffic, self.hosts.hosts_in(network))
    }
}

// ── SnapshotStore ───────────────────────────────────────────────────

/// Single-slot holder of the latest snapshot.
pub struct SnapshotStore {
    tx: watch::Sender<Arc<RouterSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(RouterSnapshot::default()));
        Self { tx }
    }

    pub fn current(&self) -> Arc<RouterSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    /// Stamp the next version onto `snapshot` and publish it.
    pub fn publish(&self, mut snapshot: RouterSnapshot) -> u64 {
        let version = self.version() + 1;
        snapshot.version = version;
        self.tx.send_replace(Arc::new(snapshot));
        version
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.tx.subscribe())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn publish_bumps_version() {
        let store = SnapshotStore::new();
        assert_eq!(store.version(), 0);
        assert_eq!(store.publish(RouterSnapshot::default()), 1);
        assert_eq!(store.publish(RouterSnapshot::default()), 2);
        assert_eq!(store.current().version, 2);
    }

    #[tokio::test]
    async fn subscribers_see_new_versions() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe();
        assert_eq!(stream.current().version, 0);

        store.publish(RouterSnapshot {
            available: true,
            ..RouterSnapshot::default()
        });
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.version, 1);
        assert!(snap.available);
    }

    #[test]
    fn network_rate_uses_leased_members() {
        use rbwatch_api::Record;
        use std::time::Duration;

        let mut acct = TrafficAccounting::new(TrafficUnit::BytesPerSecond);
        acct.set_interval(Some(Duration::from_secs(1)));
        acct.record(Ipv4Addr::new(10, 0, 0, 5), TrafficType::Upload, 100, 1);
        acct.record(Ipv4Addr::new(10, 0, 0, 9), TrafficType::Upload, 900, 9);

        let snap = RouterSnapshot {
            hosts: Arc::new(HostRegistry::from_records(&[
                Record::new().with("address", "10.0.0.5")
            ])),
            accounting: Arc::new(acct),
            ..RouterSnapshot::default()
        };
        let net: LocalNetwork = "10.0.0.0/24".parse().unwrap();
        // 10.0.0.9 has no lease, so it is not a member.
        assert!((snap.network_rate_bytes(&net, TrafficType::Upload) - 100.0).abs() < f64::EPSILON);
        assert_eq!(snap.network_rate_packets(&net, TrafficType::Upload), 1);
    }
}
