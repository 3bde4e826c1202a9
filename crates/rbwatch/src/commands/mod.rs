//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod hosts;
pub mod queues;
pub mod scripts;
pub mod sensors;
pub mod switches;
pub mod util;
pub mod variables;
pub mod watch;

use rbwatch_core::{Monitor, RestClient};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// The monitor every router-bound command runs against.
pub type RouterMonitor = Monitor<RestClient>;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    monitor: &RouterMonitor,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sensors(args) => sensors::handle(monitor, &args, global).await,
        Command::Watch(args) => watch::handle(monitor, &args, global).await,
        Command::Hosts => hosts::handle(monitor, global),
        Command::Queues(args) => queues::handle(monitor, args, global).await,
        Command::Switches(args) => switches::handle(monitor, args, global).await,
        Command::Scripts(args) => scripts::handle(monitor, args, global).await,
        Command::Variables => variables::handle(monitor, global).await,
        // Config and Completions are handled before a monitor exists
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a router connection".into(),
        )),
    }
}
