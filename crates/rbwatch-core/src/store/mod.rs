// ── Registries and published state ──

pub mod hosts;
pub mod queues;
pub mod snapshot;
pub mod variables;

pub use hosts::HostRegistry;
pub use queues::QueueRegistry;
pub use snapshot::{RouterSnapshot, SnapshotStore};
pub use variables::{ScriptRegistry, VariableRegistry};
