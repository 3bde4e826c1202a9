// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The monitor
// routes each variant through the command slot; none of them update local
// state, so their effect shows up on the next refresh pass.

use rbwatch_api::{Params, Record};

use crate::error::CoreError;

// ── Router menu paths ───────────────────────────────────────────────

pub const LEASES: &str = "/ip/dhcp-server/lease/print";
pub const DHCP_NETWORKS: &str = "/ip/dhcp-server/network/print";
pub const ACCOUNTING: &str = "/ip/accounting/print";
pub const SNAPSHOT_TAKE: &str = "/ip/accounting/snapshot/take";
pub const SNAPSHOT_PRINT: &str = "/ip/accounting/snapshot/print";
pub const QUEUES: &str = "/queue/simple/print";
pub const QUEUE_SET: &str = "/queue/simple/set";
pub const SCRIPTS: &str = "/system/script/print";
pub const SCRIPT_RUN: &str = "/system/script/run";
pub const SCRIPT_ENVIRONMENT: &str = "/system/script/environment/print";

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All write (and ad-hoc query) operations against the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enable or disable a simple queue by `.id`.
    SetQueueState { id: String, enabled: bool },
    /// Run a configured switch's on or off command.
    SetSwitch { name: String, on: bool },
    /// Run a configured switch's state command and derive on/off.
    QuerySwitch { name: String },
    /// Run a script known at startup.
    RunScript { name: String },
    /// Issue an arbitrary command verbatim.
    Raw { path: String, params: Params },
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    State(bool),
    Records(Vec<Record>),
}

impl Command {
    /// Parameters for toggling a queue; the router takes the inverse flag.
    pub(crate) fn queue_params(id: &str, enabled: bool) -> Params {
        Params::new().with(".id", id).with("disabled", !enabled)
    }
}

/// A switch is on when any returned row is both valid and enabled.
pub fn switch_state(rows: &[Record]) -> bool {
    rows.iter()
        .any(|r| r.get_bool("invalid") == Some(false) && r.get_bool("disabled") == Some(false))
}
