//! Long-running watch loop: print sensors after every published pass.

use futures_util::StreamExt;
use rbwatch_core::SensorSet;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;
use super::sensors::render_readings;

pub async fn handle(
    monitor: &RouterMonitor,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let subscription = monitor.subscribe();
    // Lease-dependent targets are planned once, like sensors registered at startup.
    let sensors = SensorSet::plan(monitor.config(), subscription.current());
    if sensors.is_empty() {
        return Err(CliError::Validation {
            field: "monitored_addresses".into(),
            reason: "no sensors to watch; add addresses or networks to the profile".into(),
        });
    }
    if !global.quiet {
        eprintln!(
            "Watching {} sensors every {} (Ctrl-C to stop)",
            sensors.len(),
            humantime::format_duration(monitor.config().scan_interval)
        );
    }

    let mut snapshots = subscription.into_stream();
    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            snapshot = snapshots.next() => {
                let Some(snapshot) = snapshot else { break };
                seen += 1;

                if matches!(global.output, OutputFormat::Table) && !global.quiet {
                    let at = snapshot
                        .taken_at
                        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
                        .unwrap_or_default();
                    println!("── #{} {at} ──", snapshot.version);
                }
                let out = render_readings(&sensors, &snapshot, global);
                output::print_output(&out, global.quiet);

                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}
