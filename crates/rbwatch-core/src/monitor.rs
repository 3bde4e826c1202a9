// ── Monitor ──
//
// Full lifecycle management for one router: session setup, the one-time
// startup checks, periodic refresh passes, command routing, and snapshot
// publication.

use std::sync::Arc;

use chrono::Utc;
use rbwatch_api::{Params, RestClient, RouterClient};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::LocalNetworks;
use crate::command::{self, Command, CommandEnvelope, CommandResult, switch_state};
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::gate::CommandGate;
use crate::model::LocalNetwork;
use crate::refresh::{PassReport, RefreshState};
use crate::store::{RouterSnapshot, ScriptRegistry, SnapshotStore};
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Monitor ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable. Owns the router client, all registries and the
/// accounting state; consumers read published [`RouterSnapshot`]s and send
/// [`Command`]s.
pub struct Monitor<C: RouterClient> {
    inner: Arc<MonitorInner<C>>,
}

impl<C: RouterClient> Clone for Monitor<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<C: RouterClient> {
    config: MonitorConfig,
    gate: CommandGate<C>,
    store: SnapshotStore,
    state: Mutex<RefreshState>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor<RestClient> {
    /// Create a monitor talking to the router over its REST API.
    pub fn from_config(config: MonitorConfig) -> Result<Self, CoreError> {
        let client = config.rest_client()?;
        Ok(Self::new(config, client))
    }
}

impl<C: RouterClient> Monitor<C> {
    /// Create a monitor around `client`. Does NOT contact the router --
    /// call [`start()`](Self::start).
    pub fn new(config: MonitorConfig, client: C) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let state = RefreshState::new(config.traffic_unit, !config.tracked_variables.is_empty());

        Self {
            inner: Arc::new(MonitorInner {
                config,
                gate: CommandGate::new(client),
                store: SnapshotStore::new(),
                state: Mutex::new(state),
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &C {
        self.inner.gate.client()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect, run the startup checks and the first pass, then spawn the
    /// background tasks.
    ///
    /// Fails with [`CoreError::AccountingDisabled`] when IP accounting is
    /// off on the router; connectivity problems surface as connection or
    /// authentication errors instead.
    pub async fn start(&self) -> Result<PassReport, CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        if let Err(e) = self.startup().await {
            self.inner
                .connection_state
                .send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let report = self.refresh().await;

        let mut handles = self.inner.task_handles.lock().await;
        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(self.clone(), rx)));
        }
        if !self.inner.config.scan_interval.is_zero() {
            handles.push(tokio::spawn(refresh_task(
                self.clone(),
                self.inner.cancel.clone(),
            )));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(url = %self.inner.config.url, "monitoring router");
        Ok(report)
    }

    async fn startup(&self) -> Result<(), CoreError> {
        let gate = &self.inner.gate;
        let none = Params::new();

        gate.reconnect().await?;
        debug!("router session established");

        let accounting = gate.issue_required(command::ACCOUNTING, &none).await?;
        let enabled = accounting
            .first()
            .and_then(|r| r.get_bool("enabled"))
            .unwrap_or(false);
        if !enabled {
            warn!("IP accounting is disabled on the router");
            return Err(CoreError::AccountingDisabled);
        }

        let rows = gate.issue_required(command::DHCP_NETWORKS, &none).await?;
        let networks: LocalNetworks = rows
            .iter()
            .filter_map(|row| match LocalNetwork::try_from(row) {
                Ok(net) => Some(net),
                Err(e) => {
                    warn!(error = %e, "ignoring DHCP network");
                    None
                }
            })
            .collect();
        info!(networks = networks.len(), "loaded local networks");

        // Throwaway snapshot: clears counters that piled up before we started.
        gate.issue_required(command::SNAPSHOT_TAKE, &none).await?;
        self.inner.state.lock().await.clock.mark();

        let scripts = gate.issue_required(command::SCRIPTS, &none).await?;
        let scripts = ScriptRegistry::from_records(&scripts);
        for script in scripts.iter() {
            debug!(name = %script.name, "found script");
        }

        let mut state = self.inner.state.lock().await;
        state.networks = Arc::new(networks);
        state.scripts = Arc::new(scripts);
        Ok(())
    }

    /// Stop the background tasks.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("monitor stopped");
    }

    /// Run one refresh pass and publish the result. Passes never overlap.
    pub async fn refresh(&self) -> PassReport {
        let mut state = self.inner.state.lock().await;
        let report = state.run_pass(&self.inner.gate).await;
        let snapshot = state.snapshot(report.clone(), Utc::now());
        drop(state);

        let version = self.inner.store.publish(snapshot);
        if report.is_clean() {
            debug!(version, attempts = report.attempts, "refresh pass complete");
        } else {
            warn!(version, failed = ?report.failed, "refresh pass left stale data");
        }
        report
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command through the command processor task.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::NotRunning);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotRunning)?;

        rx.await.map_err(|_| CoreError::NotRunning)?
    }

    pub async fn set_queue_state(&self, id: &str, enabled: bool) -> Result<(), CoreError> {
        self.execute(Command::SetQueueState {
            id: id.to_owned(),
            enabled,
        })
        .await
        .map(|_| ())
    }

    pub async fn set_switch(&self, name: &str, on: bool) -> Result<(), CoreError> {
        self.execute(Command::SetSwitch {
            name: name.to_owned(),
            on,
        })
        .await
        .map(|_| ())
    }

    pub async fn switch_state(&self, name: &str) -> Result<bool, CoreError> {
        match self
            .execute(Command::QuerySwitch {
                name: name.to_owned(),
            })
            .await?
        {
            CommandResult::State(on) => Ok(on),
            other => Err(CoreError::Internal(format!(
                "unexpected switch query result: {other:?}"
            ))),
        }
    }

    pub async fn run_script(&self, name: &str) -> Result<(), CoreError> {
        self.execute(Command::RunScript {
            name: name.to_owned(),
        })
        .await
        .map(|_| ())
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: start without a refresh timer, run closure, stop.
    pub async fn oneshot<F, Fut, T>(config: MonitorConfig, client: C, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Monitor<C>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.scan_interval = std::time::Duration::ZERO;

        let monitor = Monitor::new(cfg, client);
        monitor.start().await?;
        let result = f(monitor.clone()).await;
        monitor.stop().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<RouterSnapshot> {
        self.inner.store.current()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run a refresh pass on every scan interval tick.
async fn refresh_task<C: RouterClient>(monitor: Monitor<C>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(monitor.inner.config.scan_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                monitor.refresh().await;
            }
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task<C: RouterClient>(
    monitor: Monitor<C>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
) {
    let cancel = monitor.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&monitor, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command<C: RouterClient>(
    monitor: &Monitor<C>,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let gate = &monitor.inner.gate;
    let config = &monitor.inner.config;

    match cmd {
        Command::SetQueueState { id, enabled } => {
            if !config.manage_queues {
                return Err(CoreError::Disabled {
                    operation: "queue management".into(),
                    setting: "manage_queues".into(),
                });
            }
            let snapshot = monitor.snapshot();
            let queue = snapshot
                .queues
                .find(&id)
                .ok_or_else(|| CoreError::QueueNotFound { identifier: id.clone() })?;
            gate.issue_required(command::QUEUE_SET, &Command::queue_params(&queue.id, enabled))
                .await?;
            info!(queue = %queue.name, enabled, "queue state change requested");
            Ok(CommandResult::Ok)
        }

        Command::SetSwitch { name, on } => {
            let switch = config
                .custom_switch(&name)
                .ok_or_else(|| CoreError::SwitchNotFound { name: name.clone() })?;
            let target = if on { &switch.turn_on } else { &switch.turn_off };
            gate.issue_required(&target.path, &target.params).await?;
            Ok(CommandResult::Ok)
        }

        Command::QuerySwitch { name } => {
            let switch = config
                .custom_switch(&name)
                .ok_or_else(|| CoreError::SwitchNotFound { name: name.clone() })?;
            let rows = gate
                .issue_required(&switch.state.path, &switch.state.params)
                .await?;
            Ok(CommandResult::State(switch_state(&rows)))
        }

        Command::RunScript { name } => {
            let snapshot = monitor.snapshot();
            let script = snapshot
                .scripts
                .get(&name)
                .ok_or_else(|| CoreError::ScriptNotFound { name: name.clone() })?;
            gate.issue_required(command::SCRIPT_RUN, &Params::new().with(".id", &script.id))
                .await?;
            info!(script = %name, "script started");
            Ok(CommandResult::Ok)
        }

        Command::Raw { path, params } => {
            let rows = gate.issue_required(&path, &params).await?;
            Ok(CommandResult::Records(rows))
        }
    }
}
