// ── Refresh pass ──
//
// One pass walks the stages in a fixed order: leases, accounting, queues,
// then (when any are tracked) script variables. Each stage replaces its
// own slice of state only when it succeeds, so a failing stage leaves the
// previous pass's data in place and never blocks the stages after it.
//
// On the first failure in a pass the session is reconnected and every stage
// that has not updated yet runs again, once. Stages that already updated are
// not repeated: a second snapshot take would cut the measured interval short.
// A failure in the retried attempt is logged, its stage stays stale, and the
// pass carries on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rbwatch_api::{Params, RouterClient};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, warn};

use crate::accounting::{SnapshotClock, TrafficAccounting};
use crate::classify::LocalNetworks;
use crate::command;
use crate::error::CoreError;
use crate::gate::CommandGate;
use crate::store::{HostRegistry, QueueRegistry, RouterSnapshot, ScriptRegistry, VariableRegistry};
use crate::units::TrafficUnit;

/// A data source refreshed once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Leases,
    Accounting,
    Queues,
    Variables,
}

/// What happened during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// 1, or 2 when stages were retried after a reconnect.
    pub attempts: u32,
    pub retried: bool,
    /// Stages that failed in the final attempt.
    pub failed: Vec<Stage>,
    /// Stages skipped in the final attempt because the command slot stayed busy.
    pub skipped: Vec<Stage>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

enum StageOutcome {
    Updated,
    Skipped,
}

/// Working state owned by the orchestrator between passes.
pub(crate) struct RefreshState {
    pub networks: Arc<LocalNetworks>,
    pub hosts: Arc<HostRegistry>,
    pub queues: Arc<QueueRegistry>,
    pub variables: Arc<VariableRegistry>,
    pub scripts: Arc<ScriptRegistry>,
    pub accounting: Arc<TrafficAccounting>,
    pub clock: SnapshotClock,
    pub track_variables: bool,
}

impl RefreshState {
    pub fn new(unit: TrafficUnit, track_variables: bool) -> Self {
        Self {
            networks: Arc::default(),
            hosts: Arc::default(),
            queues: Arc::default(),
            variables: Arc::default(),
            scripts: Arc::default(),
            accounting: Arc::new(TrafficAccounting::new(unit)),
            clock: SnapshotClock::new(),
            track_variables,
        }
    }

    fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Leases, Stage::Accounting, Stage::Queues];
        if self.track_variables {
            stages.push(Stage::Variables);
        }
        stages
    }

    /// Freeze the current state for publication.
    pub fn snapshot(&self, report: PassReport, taken_at: DateTime<Utc>) -> RouterSnapshot {
        RouterSnapshot {
            version: 0,
            taken_at: Some(taken_at),
            available: report.is_clean(),
            networks: self.networks.clone(),
            hosts: self.hosts.clone(),
            queues: self.queues.clone(),
            variables: self.variables.clone(),
            scripts: self.scripts.clone(),
            accounting: self.accounting.clone(),
            report: Some(report),
        }
    }

    async fn run_stage<C: RouterClient>(
        &mut self,
        gate: &CommandGate<C>,
        stage: Stage,
    ) -> Result<StageOutcome, CoreError> {
        let none = Params::new();
        match stage {
            Stage::Leases => {
                let Some(rows) = gate.issue(command::LEASES, &none).await? else {
                    return Ok(StageOutcome::Skipped);
                };
                self.hosts = Arc::new(HostRegistry::from_records(&rows));
                debug!(hosts = self.hosts.len(), "retrieved leases");
            }
            Stage::Accounting => {
                if gate.issue(command::SNAPSHOT_TAKE, &none).await?.is_none() {
                    return Ok(StageOutcome::Skipped);
                }
                let interval = self.clock.mark();
                debug!(?interval, "time between snapshots");

                let Some(rows) = gate.issue(command::SNAPSHOT_PRINT, &none).await? else {
                    return Ok(StageOutcome::Skipped);
                };
                let mut accounting = TrafficAccounting::new(self.accounting.unit());
                accounting.set_interval(interval);
                let summary = accounting.ingest(&self.networks, &rows);
                self.accounting = Arc::new(accounting);
                debug!(
                    rows = summary.rows,
                    credited = summary.credited,
                    foreign = summary.foreign,
                    "traffic data updated"
                );
            }
            Stage::Queues => {
                let Some(rows) = gate.issue(command::QUEUES, &none).await? else {
                    return Ok(StageOutcome::Skipped);
                };
                self.queues = Arc::new(QueueRegistry::from_records(&rows));
                debug!(queues = self.queues.len(), "retrieved queues");
            }
            Stage::Variables => {
                let Some(rows) = gate.issue(command::SCRIPT_ENVIRONMENT, &none).await? else {
                    return Ok(StageOutcome::Skipped);
                };
                self.variables = Arc::new(VariableRegistry::from_records(&rows));
                debug!(variables = self.variables.len(), "retrieved variables");
            }
        }
        Ok(StageOutcome::Updated)
    }

    /// Run one full pass with at most one reconnect-and-retry.
    pub async fn run_pass<C: RouterClient>(&mut self, gate: &CommandGate<C>) -> PassReport {
        let mut report = PassReport::default();
        let mut pending = self.stages();

        'pass: loop {
            report.attempts += 1;
            let stages = std::mem::take(&mut pending);
            let mut skipped = Vec::new();
            report.failed.clear();

            for (i, &stage) in stages.iter().enumerate() {
                match self.run_stage(gate, stage).await {
                    Ok(StageOutcome::Updated) => {}
                    Ok(StageOutcome::Skipped) => {
                        warn!(%stage, "command slot busy, keeping previous data");
                        skipped.push(stage);
                    }
                    Err(e) => {
                        warn!(%stage, error = %e, "unable to refresh");
                        report.failed.push(stage);
                        match gate.reconnect().await {
                            Ok(()) if !report.retried => {
                                report.retried = true;
                                pending = skipped;
                                pending.extend_from_slice(&stages[i..]);
                                continue 'pass;
                            }
                            Ok(()) => {}
                            Err(e) => warn!(error = %e, "error reconnecting to router"),
                        }
                    }
                }
            }
            report.skipped = skipped;
            break;
        }

        report
    }
}
