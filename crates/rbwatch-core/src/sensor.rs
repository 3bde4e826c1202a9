// ── Sensor and switch views ──
//
// Read-only projections of a published snapshot. The set of sensors is
// planned once from configuration and the lease table at planning time;
// each sensor then re-reads its value from whichever snapshot it is given.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::model::{SensorKind, Target};
use crate::store::{HostRegistry, RouterSnapshot};
use crate::units::TrafficUnit;

// ── Identifiers ─────────────────────────────────────────────────────

/// Lower-case, with every run of non-alphanumerics folded into one `_`.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// First character upper-case, the rest lower-case.
fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ── Target planning ─────────────────────────────────────────────────

/// Expand configured addresses into concrete monitoring targets.
///
/// Networks are always kept, and with `expand_hosts` every leased host
/// inside them is added. Single hosts are kept only if they hold a lease
/// right now. Unparsable entries are skipped.
pub fn plan_targets(addresses: &[String], expand_hosts: bool, hosts: &HostRegistry) -> Vec<Target> {
    let mut targets = Vec::new();
    for raw in addresses {
        match raw.parse::<Target>() {
            Ok(Target::Network(net)) => {
                debug!(network = %net, "tracking requested network");
                targets.push(Target::Network(net));
                if expand_hosts {
                    let members = hosts.hosts_in(&net);
                    debug!(network = %net, hosts = members.len(), "expanding network hosts");
                    targets.extend(members.into_iter().map(Target::Host));
                }
            }
            Ok(Target::Host(addr)) => {
                if hosts.exists(addr) {
                    debug!(host = %addr, "tracking requested host");
                    targets.push(Target::Host(addr));
                } else {
                    info!(host = %addr, "requested host has no lease, not tracking");
                }
            }
            Err(e) => {
                warn!(error = %e, "IPv4 address (192.168.1.1) or network (192.168.1.0/24) expected");
            }
        }
    }
    targets
}

// ── Sensor state ────────────────────────────────────────────────────

/// The value a sensor reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorState {
    /// Host activity.
    OnOff(bool),
    /// Active hosts in a network.
    Count(usize),
    /// Traffic rate in the configured unit.
    Rate(f64),
    /// Script variable value.
    Text(String),
    Unknown,
}

impl SensorState {
    pub fn render(&self, unit: TrafficUnit) -> String {
        match self {
            Self::OnOff(true) => "on".into(),
            Self::OnOff(false) => "off".into(),
            Self::Count(n) => n.to_string(),
            Self::Rate(v) => unit.format(*v),
            Self::Text(s) => s.clone(),
            Self::Unknown => "unknown".into(),
        }
    }
}

/// One sensor's value as of a given snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub entity_id: String,
    pub name: String,
    pub state: SensorState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<TrafficUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets_per_second: Option<u64>,
    pub available: bool,
}

impl SensorReading {
    pub fn state_display(&self) -> String {
        self.state.render(self.unit.unwrap_or_default())
    }
}

// ── Address sensors ─────────────────────────────────────────────────

/// A (target, kind) pair with a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSensor {
    pub entity_id: String,
    pub target: Target,
    pub kind: SensorKind,
}

impl AddressSensor {
    pub fn new(client_name: &str, target: Target, kind: SensorKind) -> Self {
        let suffix = match (kind, target.is_network()) {
            (SensorKind::Active, true) => "active_hosts",
            (SensorKind::Active, false) => "activity",
            (other, _) => other.into(),
        };
        let entity_id = slugify(&format!(
            "{client_name}_{}_{target}_{suffix}",
            target.kind_label()
        ));
        Self {
            entity_id,
            target,
            kind,
        }
    }

    pub fn name(&self, snapshot: &RouterSnapshot) -> String {
        match self.target {
            Target::Network(net) => format!("Network {net} {}", self.kind.title()),
            Target::Host(addr) => snapshot.hosts.name(addr),
        }
    }

    pub fn read(&self, snapshot: &RouterSnapshot) -> SensorReading {
        let (state, unit, pps) = match (self.kind.traffic_type(), self.target) {
            (None, Target::Host(addr)) => (SensorState::OnOff(snapshot.hosts.is_active(addr)), None, None),
            (None, Target::Network(net)) => (
                SensorState::Count(snapshot.hosts.active_hosts_in(&net).len()),
                None,
                None,
            ),
            (Some(traffic), Target::Host(addr)) => (
                SensorState::Rate(snapshot.rate_bytes(addr, traffic)),
                Some(snapshot.unit()),
                Some(snapshot.rate_packets(addr, traffic)),
            ),
            (Some(traffic), Target::Network(net)) => (
                SensorState::Rate(snapshot.network_rate_bytes(&net, traffic)),
                Some(snapshot.unit()),
                Some(snapshot.network_rate_packets(&net, traffic)),
            ),
        };
        SensorReading {
            entity_id: self.entity_id.clone(),
            name: self.name(snapshot),
            state,
            unit,
            packets_per_second: pps,
            available: snapshot.available,
        }
    }
}

// ── Variable sensors ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSensor {
    pub entity_id: String,
    pub variable: String,
}

impl VariableSensor {
    pub fn new(client_name: &str, variable: &str) -> Self {
        Self {
            entity_id: slugify(&format!("{client_name}_var_{variable}")),
            variable: variable.to_owned(),
        }
    }

    pub fn read(&self, snapshot: &RouterSnapshot) -> SensorReading {
        SensorReading {
            entity_id: self.entity_id.clone(),
            name: capitalize(&self.variable),
            state: snapshot
                .variables
                .get(&self.variable)
                .map_or(SensorState::Unknown, |v| SensorState::Text(v.to_owned())),
            unit: None,
            packets_per_second: None,
            available: snapshot.available,
        }
    }
}

// ── SensorSet ───────────────────────────────────────────────────────

/// Every sensor planned for one monitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensorSet {
    pub address: Vec<AddressSensor>,
    pub variables: Vec<VariableSensor>,
}

impl SensorSet {
    /// Plan sensors against the lease table in `snapshot`.
    pub fn plan(config: &MonitorConfig, snapshot: &RouterSnapshot) -> Self {
        let targets = plan_targets(
            &config.monitored_addresses,
            config.expand_network_hosts,
            &snapshot.hosts,
        );
        let address: Vec<AddressSensor> = targets
            .iter()
            .flat_map(|target| {
                config
                    .monitored_traffic
                    .iter()
                    .map(|kind| AddressSensor::new(&config.client_name, *target, *kind))
            })
            .collect();
        let variables = config
            .tracked_variables
            .iter()
            .map(|v| VariableSensor::new(&config.client_name, v))
            .collect();
        info!(sensors = address.len(), "generated sensors");
        Self { address, variables }
    }

    pub fn read_all(&self, snapshot: &RouterSnapshot) -> Vec<SensorReading> {
        self.address
            .iter()
            .map(|s| s.read(snapshot))
            .chain(self.variables.iter().map(|v| v.read(snapshot)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.address.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Queue switches ──────────────────────────────────────────────────

/// A simple queue presented as an on/off switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSwitch {
    pub entity_id: String,
    pub id: String,
    pub name: String,
    pub on: bool,
    pub target: String,
    pub download_limit: Option<String>,
    pub upload_limit: Option<String>,
}

impl QueueSwitch {
    pub fn all(client_name: &str, snapshot: &RouterSnapshot) -> Vec<Self> {
        snapshot
            .queues
            .iter()
            .map(|q| Self {
                entity_id: slugify(&format!("{client_name}_queue_{}_{}", q.target, q.id)),
                id: q.id.clone(),
                name: q.name.clone(),
                on: q.is_enabled(),
                target: q.target_display(),
                download_limit: q.max_limit.map(|l| l.download_display()),
                upload_limit: q.max_limit.map(|l| l.upload_display()),
            })
            .collect()
    }
}

impl fmt::Display for QueueSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, if self.on { "on" } else { "off" })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rbwatch_api::Record;

    use crate::accounting::TrafficAccounting;
    use crate::model::TrafficType;
    use crate::store::{QueueRegistry, VariableRegistry};

    fn hosts() -> HostRegistry {
        HostRegistry::from_records(&[
            Record::new()
                .with("address", "10.0.0.5")
                .with("host-name", "laptop")
                .with("status", "bound"),
            Record::new()
                .with("address", "10.0.0.6")
                .with("status", "waiting"),
        ])
    }

    fn snapshot() -> RouterSnapshot {
        let mut acct = TrafficAccounting::new(TrafficUnit::MegabitsPerSecond);
        acct.set_interval(Some(Duration::from_secs(1)));
        acct.record(Ipv4Addr::new(10, 0, 0, 5), TrafficType::Upload, 125_000, 100);
        RouterSnapshot {
            available: true,
            hosts: Arc::new(hosts()),
            accounting: Arc::new(acct),
            ..RouterSnapshot::default()
        }
    }

    #[test]
    fn slugify_folds_separators() {
        assert_eq!(slugify("RouterBoard_net_10.0.0.0/24_active_hosts"), "routerboard_net_10_0_0_0_24_active_hosts");
        assert_eq!(slugify("Home Router_var__Mode"), "home_router_var_mode");
    }

    #[test]
    fn planning_expands_and_filters() {
        let addrs = vec![
            "10.0.0.0/24".to_owned(),
            "10.0.0.5".to_owned(),
            "10.0.0.77".to_owned(),
            "not-an-address".to_owned(),
        ];
        let plain = plan_targets(&addrs, false, &hosts());
        assert_eq!(plain.len(), 2);

        let expanded = plan_targets(&addrs, true, &hosts());
        assert_eq!(
            expanded,
            vec![
                "10.0.0.0/24".parse().unwrap(),
                Target::Host(Ipv4Addr::new(10, 0, 0, 5)),
                Target::Host(Ipv4Addr::new(10, 0, 0, 6)),
                Target::Host(Ipv4Addr::new(10, 0, 0, 5)),
            ]
        );
    }

    #[test]
    fn entity_ids_follow_kind_and_target() {
        let net: Target = "10.0.0.0/24".parse().unwrap();
        let host = Target::Host(Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(
            AddressSensor::new("RouterBoard", net, SensorKind::Active).entity_id,
            "routerboard_net_10_0_0_0_24_active_hosts"
        );
        assert_eq!(
            AddressSensor::new("RouterBoard", host, SensorKind::Active).entity_id,
            "routerboard_host_10_0_0_5_activity"
        );
        assert_eq!(
            AddressSensor::new("RouterBoard", host, SensorKind::Upload).entity_id,
            "routerboard_host_10_0_0_5_upload"
        );
    }

    #[test]
    fn readings_reflect_snapshot() {
        let snap = snapshot();
        let net: Target = "10.0.0.0/24".parse().unwrap();
        let host = Target::Host(Ipv4Addr::new(10, 0, 0, 5));

        let active = AddressSensor::new("rb", net, SensorKind::Active).read(&snap);
        assert_eq!(active.state, SensorState::Count(1));
        assert_eq!(active.name, "Network 10.0.0.0/24 Active");

        let activity = AddressSensor::new("rb", host, SensorKind::Active).read(&snap);
        assert_eq!(activity.state, SensorState::OnOff(true));
        assert_eq!(activity.name, "laptop");

        let upload = AddressSensor::new("rb", host, SensorKind::Upload).read(&snap);
        assert_eq!(upload.state, SensorState::Rate(1.0));
        assert_eq!(upload.packets_per_second, Some(100));
        assert_eq!(upload.unit, Some(TrafficUnit::MegabitsPerSecond));
        assert_eq!(upload.state_display(), "1.00");

        let download = AddressSensor::new("rb", host, SensorKind::Download).read(&snap);
        assert_eq!(download.state, SensorState::Rate(0.0));
    }

    #[test]
    fn variable_sensor_capitalizes_and_reads_value() {
        let mut snap = snapshot();
        snap.variables = Arc::new(VariableRegistry::from_records(&[
            Record::new().with("name", "alarmMode").with("value", "armed"),
        ]));
        let sensor = VariableSensor::new("rb", "alarmMode");
        let reading = sensor.read(&snap);
        assert_eq!(reading.name, "Alarmmode");
        assert_eq!(reading.state, SensorState::Text("armed".into()));
        assert_eq!(VariableSensor::new("rb", "missing").read(&snap).state, SensorState::Unknown);
    }

    #[test]
    fn queue_switch_attributes() {
        let mut snap = snapshot();
        snap.queues = Arc::new(QueueRegistry::from_records(&[Record::new()
            .with(".id", "*1")
            .with("name", "kids")
            .with("target", "10.0.0.5/32,10.0.0.6/32")
            .with("max-limit", "1000000/5000000")
            .with("disabled", "false")
            .with("invalid", "false")]));
        let switches = QueueSwitch::all("RouterBoard", &snap);
        assert_eq!(switches.len(), 1);
        let s = &switches[0];
        assert_eq!(s.entity_id, "routerboard_queue_10_0_0_5_32_10_0_0_6_32_1");
        assert!(s.on);
        assert_eq!(s.target, "10.0.0.5/32, 10.0.0.6/32");
        assert_eq!(s.upload_limit.as_deref(), Some("1Mbits/s"));
        assert_eq!(s.download_limit.as_deref(), Some("5Mbits/s"));
    }
}
