//! Sensor readings: one measured sample.

use tabled::Tabled;

use rbwatch_core::{RouterSnapshot, SensorReading, SensorSet};

use crate::cli::{GlobalOpts, SensorsArgs};
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Pkt/s")]
    packets: String,
}

fn row(r: &SensorReading, color: bool) -> SensorRow {
    SensorRow {
        entity_id: r.entity_id.clone(),
        name: r.name.clone(),
        state: output::stale(r.state_display(), r.available, color),
        unit: r.unit.map(|u| u.symbol().to_owned()).unwrap_or_default(),
        packets: r
            .packets_per_second
            .map(|p| p.to_string())
            .unwrap_or_default(),
    }
}

/// Render every reading for `snapshot`.
pub(crate) fn render_readings(
    sensors: &SensorSet,
    snapshot: &RouterSnapshot,
    global: &GlobalOpts,
) -> String {
    let color = output::should_color(&global.color);
    let readings = sensors.read_all(snapshot);
    output::render_list(
        &global.output,
        &readings,
        |r| row(r, color),
        |r| format!("{}\t{}", r.entity_id, r.state_display()),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &RouterMonitor,
    args: &SensorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // The startup pass measured almost nothing; give the counters time.
    tokio::time::sleep(args.sample).await;
    let report = monitor.refresh().await;
    if !report.is_clean() && !global.quiet {
        eprintln!("warning: stale data from {:?}", report.failed);
    }

    let snapshot = monitor.snapshot();
    let sensors = SensorSet::plan(monitor.config(), &snapshot);
    if sensors.is_empty() && !global.quiet {
        eprintln!("No sensors configured. Add monitored_addresses to the profile.");
        return Ok(());
    }

    let out = render_readings(&sensors, &snapshot, global);
    output::print_output(&out, global.quiet);
    Ok(())
}
