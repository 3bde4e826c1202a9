// rbwatch-core: Business logic between rbwatch-api and the CLI.
//
// Classifies IP accounting flows against the router's local networks,
// turns per-interval counters into rates, keeps lease/queue/variable
// registries, and publishes an immutable snapshot after every refresh
// pass.

pub mod accounting;
pub mod classify;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod gate;
pub mod model;
pub mod monitor;
pub mod refresh;
pub mod sensor;
pub mod store;
pub mod stream;
pub mod units;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accounting::{IngestSummary, SnapshotClock, TrafficAccounting};
pub use classify::{FlowClass, LocalNetworks};
pub use command::{Command, CommandResult};
pub use config::{CustomSwitch, MonitorConfig, SwitchCommand, TlsVerification};
pub use error::CoreError;
pub use gate::CommandGate;
pub use monitor::{ConnectionState, Monitor};
pub use refresh::{PassReport, Stage};
pub use sensor::{AddressSensor, QueueSwitch, SensorReading, SensorSet, SensorState, VariableSensor};
pub use store::{RouterSnapshot, SnapshotStore};
pub use stream::{SnapshotStream, SnapshotWatchStream};
pub use units::TrafficUnit;

// Re-export model types at the crate root for convenience.
pub use model::{
    FlowSample, Lease, LocalNetwork, MacAddress, Queue, QueueLimits, Script, SensorKind, Target,
    TrafficType, Variable,
};

// Transport-level types consumers need to build or fake a client.
pub use rbwatch_api::{Params, Record, RestClient, RouterClient};
