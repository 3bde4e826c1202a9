//! Router script commands.

use tabled::Tabled;

use rbwatch_core::Script;

use crate::cli::{GlobalOpts, ScriptsArgs, ScriptsCommand};
use crate::error::CliError;
use crate::output;

use super::{RouterMonitor, util};

#[derive(Tabled)]
struct ScriptRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

pub async fn handle(
    monitor: &RouterMonitor,
    args: ScriptsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ScriptsCommand::List => {
            let snapshot = monitor.snapshot();
            let scripts: Vec<Script> = snapshot.scripts.iter().cloned().collect();
            let out = output::render_list(
                &global.output,
                &scripts,
                |s| ScriptRow {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    comment: s.comment.clone().unwrap_or_default(),
                },
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ScriptsCommand::Run { name } => {
            if !util::confirm(&format!("Run script '{name}' on the router?"), global.yes)? {
                return Ok(());
            }
            monitor.run_script(&name).await?;
            if !global.quiet {
                eprintln!("Script '{name}' started");
            }
            Ok(())
        }
    }
}
