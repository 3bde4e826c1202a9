// ── Domain model ──
//
// Typed views over the flat records a router returns. Every type here is
// built from a `Record` in `crate::convert` and never talks to the router
// itself.

pub mod lease;
pub mod mac;
pub mod network;
pub mod queue;
pub mod script;
pub mod traffic;

// ── Re-exports ──────────────────────────────────────────────────────

pub use lease::Lease;
pub use mac::MacAddress;
pub use network::{LocalNetwork, Target, TargetParseError};
pub use queue::{Queue, QueueLimits};
pub use script::{Script, Variable};
pub use traffic::{FlowSample, SensorKind, TrafficType};
