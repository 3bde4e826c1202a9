//! Custom switch commands.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, SwitchesArgs, SwitchesCommand};
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;

#[derive(Serialize)]
struct SwitchStatus {
    name: String,
    on: Option<bool>,
}

#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

pub async fn handle(
    monitor: &RouterMonitor,
    args: SwitchesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        SwitchesCommand::List => {
            let mut statuses = Vec::new();
            for switch in &monitor.config().custom_switches {
                let on = match monitor.switch_state(&switch.name).await {
                    Ok(on) => Some(on),
                    Err(e) => {
                        tracing::warn!(switch = %switch.name, error = %e, "state query failed");
                        None
                    }
                };
                statuses.push(SwitchStatus {
                    name: switch.name.clone(),
                    on,
                });
            }
            let out = output::render_list(
                &global.output,
                &statuses,
                |s| SwitchRow {
                    name: s.name.clone(),
                    state: s.on.map_or_else(|| "unknown".into(), |on| output::on_off(on, color)),
                },
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SwitchesCommand::On { name } => {
            monitor.set_switch(&name, true).await?;
            if !global.quiet {
                eprintln!("Switch '{name}' turned on");
            }
            Ok(())
        }

        SwitchesCommand::Off { name } => {
            monitor.set_switch(&name, false).await?;
            if !global.quiet {
                eprintln!("Switch '{name}' turned off");
            }
            Ok(())
        }

        SwitchesCommand::State { name } => {
            let on = monitor.switch_state(&name).await?;
            let status = SwitchStatus {
                name,
                on: Some(on),
            };
            let out = output::render_single(
                &global.output,
                &status,
                |_| output::on_off(on, color),
                |_| if on { "on".into() } else { "off".into() },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
