//! Script environment variables.

use tabled::Tabled;

use rbwatch_core::command::SCRIPT_ENVIRONMENT;
use rbwatch_core::store::VariableRegistry;
use rbwatch_core::{Command as CoreCommand, CommandResult, Params, Variable};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(monitor: &RouterMonitor, global: &GlobalOpts) -> Result<(), CliError> {
    let tracked = &monitor.config().tracked_variables;

    let variables: Vec<Variable> = if tracked.is_empty() {
        // Nothing tracked: show the whole environment.
        let result = monitor
            .execute(CoreCommand::Raw {
                path: SCRIPT_ENVIRONMENT.into(),
                params: Params::new(),
            })
            .await?;
        let CommandResult::Records(rows) = result else {
            return Err(CliError::Internal("unexpected environment result".into()));
        };
        VariableRegistry::from_records(&rows)
            .iter()
            .map(|(name, value)| Variable {
                name: name.into(),
                value: value.into(),
            })
            .collect()
    } else {
        let snapshot = monitor.snapshot();
        tracked
            .iter()
            .map(|name| Variable {
                name: name.clone(),
                value: snapshot.variables.get(name).unwrap_or_default().into(),
            })
            .collect()
    };

    let out = output::render_list(
        &global.output,
        &variables,
        |v| VariableRow {
            name: v.name.clone(),
            value: v.value.clone(),
        },
        |v| format!("{}={}", v.name, v.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
