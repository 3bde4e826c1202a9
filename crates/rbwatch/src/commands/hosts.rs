//! DHCP lease listing.

use tabled::Tabled;

use rbwatch_core::Lease;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::RouterMonitor;

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Active")]
    active: String,
}

pub fn handle(monitor: &RouterMonitor, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let snapshot = monitor.snapshot();
    let leases: Vec<Lease> = snapshot.hosts.iter().cloned().collect();

    let out = output::render_list(
        &global.output,
        &leases,
        |l| HostRow {
            address: l.address.to_string(),
            name: l.display_name(),
            mac: l.mac().to_string(),
            status: l.status.clone().unwrap_or_else(|| "-".into()),
            active: output::on_off(l.is_active(), color),
        },
        |l| l.address.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
