//! Simple queue commands.

use tabled::Tabled;

use rbwatch_core::QueueSwitch;

use crate::cli::{GlobalOpts, QueuesArgs, QueuesCommand};
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Download")]
    download: String,
    #[tabled(rename = "Upload")]
    upload: String,
}

fn print_queues(monitor: &RouterMonitor, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let queues = QueueSwitch::all(&monitor.config().client_name, &monitor.snapshot());
    let out = output::render_list(
        &global.output,
        &queues,
        |q| QueueRow {
            id: q.id.clone(),
            name: q.name.clone(),
            state: output::on_off(q.on, color),
            target: q.target.clone(),
            download: q.download_limit.clone().unwrap_or_else(|| "-".into()),
            upload: q.upload_limit.clone().unwrap_or_else(|| "-".into()),
        },
        |q| q.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &RouterMonitor,
    args: QueuesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (queue, enabled) = match args.command {
        QueuesCommand::List => {
            print_queues(monitor, global);
            return Ok(());
        }
        QueuesCommand::Enable { queue } => (queue, true),
        QueuesCommand::Disable { queue } => (queue, false),
    };

    monitor.set_queue_state(&queue, enabled).await?;

    // The router is the source of truth: re-read before reporting.
    monitor.refresh().await;
    let snapshot = monitor.snapshot();
    if let Some(q) = snapshot.queues.find(&queue) {
        if !global.quiet {
            eprintln!(
                "Queue '{}' is now {}",
                q.name,
                if q.is_enabled() { "enabled" } else { "disabled" }
            );
        }
    }
    Ok(())
}
