mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rbwatch_core::Monitor;
use rbwatch_core::config::DEFAULT_SCAN_INTERVAL;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_json);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a router connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "rbwatch", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let mut monitor_config = config::build_monitor_config(&cli.global)?;
            match &cmd {
                Command::Watch(args) => {
                    if let Some(interval) = args.interval {
                        monitor_config.scan_interval = interval;
                    }
                    if monitor_config.scan_interval.is_zero() {
                        monitor_config.scan_interval = DEFAULT_SCAN_INTERVAL;
                    }
                }
                // One-shot commands run passes on demand.
                _ => monitor_config.scan_interval = Duration::ZERO,
            }
            let monitor = Monitor::from_config(monitor_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            monitor.start().await?;
            let result = commands::dispatch(cmd, &monitor, &cli.global).await;
            monitor.stop().await;
            result
        }
    }
}
