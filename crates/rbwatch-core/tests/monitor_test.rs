#![allow(clippy::unwrap_used)]
// Integration tests for `Monitor` against a scripted in-memory router.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use url::Url;

use rbwatch_core::command;
use rbwatch_core::{
    ConnectionState, CoreError, CustomSwitch, Monitor, MonitorConfig, Params, Record,
    RouterClient, Stage, SwitchCommand, TrafficType, TrafficUnit,
};

// ── Scripted router ─────────────────────────────────────────────────

#[derive(Default)]
struct RouterState {
    responses: HashMap<String, Vec<Record>>,
    failures: HashMap<String, u32>,
    delays: HashMap<String, Duration>,
    calls: Vec<(String, Params)>,
    reconnects: u32,
}

#[derive(Clone, Default)]
struct ScriptedRouter {
    state: Arc<Mutex<RouterState>>,
}

impl ScriptedRouter {
    fn respond(&self, path: &str, rows: Vec<Record>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(path.to_owned(), rows);
    }

    /// Make the next `times` calls to `path` fail.
    fn fail(&self, path: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(path.to_owned(), times);
    }

    /// Make every call to `path` take `delay` before answering.
    fn delay(&self, path: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(path.to_owned(), delay);
    }

    fn answer(&self, path: &str, params: &Params) -> (Result<Vec<Record>, rbwatch_api::Error>, Option<Duration>) {
        let mut state = self.state.lock().unwrap();
        state.calls.push((path.to_owned(), params.clone()));
        let delay = state.delays.get(path).copied();
        if let Some(remaining) = state.failures.get_mut(path) {
            if *remaining > 0 {
                *remaining -= 1;
                let err = rbwatch_api::Error::Router {
                    status: 500,
                    message: "Internal Server Error".into(),
                    detail: None,
                };
                return (Err(err), delay);
            }
        }
        (Ok(state.responses.get(path).cloned().unwrap_or_default()), delay)
    }

    fn calls_to(&self, path: &str) -> Vec<Params> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn reconnects(&self) -> u32 {
        self.state.lock().unwrap().reconnects
    }
}

impl RouterClient for ScriptedRouter {
    async fn issue(&self, path: &str, params: &Params) -> Result<Vec<Record>, rbwatch_api::Error> {
        let (result, delay) = self.answer(path, params);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn reconnect(&self) -> Result<(), rbwatch_api::Error> {
        self.state.lock().unwrap().reconnects += 1;
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

const HOST_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
const HOST_B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 6);

fn lease(address: &str, status: &str) -> Record {
    Record::new().with("address", address).with("status", status)
}

fn flow(src: &str, dst: &str, bytes: u64, packets: u64) -> Record {
    Record::new()
        .with("src-address", src)
        .with("dst-address", dst)
        .with("bytes", bytes.to_string())
        .with("packets", packets.to_string())
}

fn router() -> ScriptedRouter {
    let router = ScriptedRouter::default();
    router.respond(
        command::ACCOUNTING,
        vec![Record::new().with("enabled", "true")],
    );
    router.respond(
        command::DHCP_NETWORKS,
        vec![Record::new().with("address", "10.0.0.0/24")],
    );
    router.respond(command::LEASES, vec![lease("10.0.0.5", "bound")]);
    router.respond(
        command::SNAPSHOT_PRINT,
        vec![flow("10.0.0.5", "8.8.8.8", 125_000, 100)],
    );
    router.respond(
        command::QUEUES,
        vec![Record::new()
            .with(".id", "*1")
            .with("name", "kids")
            .with("target", "10.0.0.5/32")
            .with("max-limit", "1000000/2000000")
            .with("disabled", "false")
            .with("invalid", "false")],
    );
    router.respond(
        command::SCRIPTS,
        vec![Record::new().with(".id", "*A").with("name", "wake-nas")],
    );
    router
}

fn config() -> MonitorConfig {
    let mut config = MonitorConfig::new(
        Url::parse("https://192.168.88.1").unwrap(),
        "api_read",
        SecretString::from("api_read".to_owned()),
    );
    config.scan_interval = Duration::ZERO;
    config.traffic_unit = TrafficUnit::MegabitsPerSecond;
    config
}

/// Start a monitor and run one more pass a second after the startup pass.
async fn started(router: &ScriptedRouter, config: MonitorConfig) -> Monitor<ScriptedRouter> {
    let monitor = Monitor::new(config, router.clone());
    monitor.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    monitor
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_startup_sequence() {
    let router = router();
    let monitor = Monitor::new(config(), router.clone());
    let report = monitor.start().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(router.reconnects(), 1);
    // One throwaway take at startup plus one in the first pass.
    assert_eq!(router.calls_to(command::SNAPSHOT_TAKE).len(), 2);

    let snap = monitor.snapshot();
    assert_eq!(snap.version, 1);
    assert!(snap.available);
    assert_eq!(snap.networks.len(), 1);
    assert_eq!(snap.scripts.len(), 1);
    assert_eq!(*monitor.connection_state().borrow(), ConnectionState::Connected);
    // No time has passed since the startup take: no valid interval yet.
    assert_eq!(snap.accounting.interval(), None);
    assert!(snap.rate_bytes(HOST_A, TrafficType::Upload).abs() < f64::EPSILON);

    monitor.stop().await;
    assert_eq!(*monitor.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_first_interval_starts_at_startup_take() {
    let router = router();
    router.delay(command::SCRIPTS, Duration::from_millis(500));
    let monitor = Monitor::new(config(), router.clone());
    monitor.start().await.unwrap();

    // The script listing after the startup take counts towards the first interval.
    let snap = monitor.snapshot();
    assert_eq!(snap.accounting.interval(), Some(Duration::from_millis(500)));
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_accounting_disabled_is_fatal_and_distinct() {
    let router = router();
    router.respond(
        command::ACCOUNTING,
        vec![Record::new().with("enabled", "false")],
    );
    let monitor = Monitor::new(config(), router.clone());

    let err = monitor.start().await.unwrap_err();
    assert!(matches!(err, CoreError::AccountingDisabled));
    assert_eq!(*monitor.connection_state().borrow(), ConnectionState::Failed);
    assert!(router.calls_to(command::LEASES).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_dhcp_network_is_ignored() {
    let router = router();
    router.respond(
        command::DHCP_NETWORKS,
        vec![
            Record::new().with("address", "10.0.0.0/24"),
            Record::new().with("address", "fd00::/64"),
        ],
    );
    let monitor = Monitor::new(config(), router);
    monitor.start().await.unwrap();
    assert_eq!(monitor.snapshot().networks.len(), 1);
    monitor.stop().await;
}

// ── Accounting ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_upload_rate_end_to_end() {
    let router = router();
    let monitor = started(&router, config()).await;
    monitor.refresh().await;

    let snap = monitor.snapshot();
    assert_eq!(snap.accounting.interval(), Some(Duration::from_secs(1)));
    assert!((snap.rate_bytes(HOST_A, TrafficType::Upload) - 1.0).abs() < 1e-9);
    assert_eq!(snap.rate_packets(HOST_A, TrafficType::Upload), 100);
    assert!(snap.rate_bytes(HOST_A, TrafficType::Download).abs() < f64::EPSILON);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_local_flow_credits_both_hosts() {
    let router = router();
    router.respond(
        command::LEASES,
        vec![lease("10.0.0.5", "bound"), lease("10.0.0.6", "bound")],
    );
    router.respond(
        command::SNAPSHOT_PRINT,
        vec![flow("10.0.0.5", "10.0.0.6", 250_000, 10)],
    );
    let mut config = config();
    config.traffic_unit = TrafficUnit::BytesPerSecond;
    let monitor = started(&router, config).await;
    monitor.refresh().await;

    let snap = monitor.snapshot();
    for host in [HOST_A, HOST_B] {
        assert_eq!(snap.accounting.byte_count(host, TrafficType::Local), Some(250_000));
        assert_eq!(snap.rate_packets(host, TrafficType::Local), 10);
    }
    // Both members carry the full count, so the network sees it twice.
    let net = "10.0.0.0/24".parse().unwrap();
    assert!((snap.network_rate_bytes(&net, TrafficType::Local) - 500_000.0).abs() < f64::EPSILON);
    monitor.stop().await;
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_lease_failure_keeps_stale_hosts_and_updates_accounting() {
    let router = router();
    let monitor = started(&router, config()).await;
    let reconnects_before = router.reconnects();

    router.respond(command::LEASES, vec![lease("10.0.0.99", "bound")]);
    router.fail(command::LEASES, 2);
    let report = monitor.refresh().await;

    assert_eq!(report.attempts, 2);
    assert!(report.retried);
    assert_eq!(report.failed, vec![Stage::Leases]);
    assert_eq!(router.reconnects(), reconnects_before + 2);

    let snap = monitor.snapshot();
    assert!(!snap.available);
    assert!(snap.hosts.exists(HOST_A));
    assert!(!snap.hosts.exists(Ipv4Addr::new(10, 0, 0, 99)));
    assert!((snap.rate_bytes(HOST_A, TrafficType::Upload) - 1.0).abs() < 1e-9);
    assert_eq!(snap.queues.len(), 1);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_recovers_on_retry() {
    let router = router();
    let monitor = started(&router, config()).await;

    router.fail(command::QUEUES, 1);
    let report = monitor.refresh().await;

    assert_eq!(report.attempts, 2);
    assert!(report.retried);
    assert!(report.is_clean());
    assert!(monitor.snapshot().available);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_does_not_repeat_updated_stages() {
    let router = router();
    let monitor = started(&router, config()).await;
    let takes_before = router.calls_to(command::SNAPSHOT_TAKE).len();
    let leases_before = router.calls_to(command::LEASES).len();

    router.fail(command::QUEUES, 1);
    let report = monitor.refresh().await;

    assert_eq!(report.attempts, 2);
    assert!(report.is_clean());
    assert_eq!(router.calls_to(command::SNAPSHOT_TAKE).len(), takes_before + 1);
    assert_eq!(router.calls_to(command::LEASES).len(), leases_before + 1);

    let snap = monitor.snapshot();
    assert_eq!(snap.accounting.interval(), Some(Duration::from_secs(1)));
    assert!((snap.rate_bytes(HOST_A, TrafficType::Upload) - 1.0).abs() < 1e-9);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_busy_slot_skips_stage_without_reconnect() {
    let router = router();
    let monitor = started(&router, config()).await;
    let reconnects_before = router.reconnects();

    router.respond(command::LEASES, vec![lease("10.0.0.99", "bound")]);
    router.respond(
        command::SNAPSHOT_PRINT,
        vec![flow("10.0.0.5", "8.8.8.8", 250_000, 10)],
    );
    router.respond(command::QUEUES, Vec::new());
    // A slow script run holds the command slot for longer than one
    // stage is willing to back off, but not for two.
    router.delay(command::SCRIPT_RUN, Duration::from_millis(1500));

    let runner = monitor.clone();
    let run = tokio::spawn(async move { runner.run_script("wake-nas").await });
    while router.calls_to(command::SCRIPT_RUN).is_empty() {
        tokio::task::yield_now().await;
    }

    let report = monitor.refresh().await;
    run.await.unwrap().unwrap();

    assert_eq!(report.attempts, 1);
    assert!(!report.retried);
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped, vec![Stage::Leases]);
    assert_eq!(router.reconnects(), reconnects_before);

    let snap = monitor.snapshot();
    assert!(snap.available);
    assert!(snap.hosts.exists(HOST_A));
    assert!(!snap.hosts.exists(Ipv4Addr::new(10, 0, 0, 99)));
    assert_eq!(snap.accounting.byte_count(HOST_A, TrafficType::Upload), Some(250_000));
    assert!(snap.queues.is_empty());
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_retries_only_once() {
    let router = router();
    let monitor = started(&router, config()).await;
    let before = router.calls_to(command::QUEUES).len();

    router.fail(command::QUEUES, 10);
    let report = monitor.refresh().await;

    assert_eq!(report.attempts, 2);
    assert_eq!(report.failed, vec![Stage::Queues]);
    assert_eq!(router.calls_to(command::QUEUES).len(), before + 2);
    // Stale queue data survives.
    assert_eq!(monitor.snapshot().queues.len(), 1);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_notified_once_per_pass() {
    let router = router();
    let monitor = started(&router, config()).await;
    let mut stream = monitor.subscribe();
    let start_version = stream.current().version;

    router.fail(command::LEASES, 1);
    monitor.refresh().await;

    let snap = stream.changed().await.unwrap();
    assert_eq!(snap.version, start_version + 1);
    assert_eq!(stream.latest().version, start_version + 1);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stream_yields_only_new_passes() {
    let router = router();
    let monitor = started(&router, config()).await;
    let subscription = monitor.subscribe();
    let start_version = subscription.current().version;
    let mut snapshots = subscription.into_stream();

    monitor.refresh().await;
    let snap = snapshots.next().await.unwrap();
    assert_eq!(snap.version, start_version + 1);

    monitor.refresh().await;
    let snap = snapshots.next().await.unwrap();
    assert_eq!(snap.version, start_version + 2);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_variables_fetched_only_when_tracked() {
    let router = router();
    router.respond(
        command::SCRIPT_ENVIRONMENT,
        vec![Record::new().with("name", "mode").with("value", "away")],
    );

    let monitor = started(&router, config()).await;
    assert!(router.calls_to(command::SCRIPT_ENVIRONMENT).is_empty());
    monitor.stop().await;

    let mut tracked = config();
    tracked.tracked_variables = vec!["mode".into()];
    let monitor = started(&router, tracked).await;
    assert_eq!(monitor.snapshot().variables.get("mode"), Some("away"));
    monitor.stop().await;
}

// ── Background refresh ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_timer_drives_passes() {
    let router = router();
    let mut config = config();
    config.scan_interval = Duration::from_secs(30);
    let monitor = Monitor::new(config, router.clone());
    monitor.start().await.unwrap();
    let mut stream = monitor.subscribe();

    let snap = stream.changed().await.unwrap();
    assert_eq!(snap.version, 2);
    assert_eq!(snap.accounting.interval(), Some(Duration::from_secs(30)));
    monitor.stop().await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_queue_toggle_requires_manage_queues() {
    let router = router();
    let monitor = started(&router, config()).await;

    let err = monitor.set_queue_state("*1", false).await.unwrap_err();
    assert!(matches!(err, CoreError::Disabled { .. }));
    assert!(router.calls_to(command::QUEUE_SET).is_empty());
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_queue_toggle_sends_inverse_flag_without_local_update() {
    let router = router();
    let mut config = config();
    config.manage_queues = true;
    let monitor = started(&router, config).await;

    monitor.set_queue_state("kids", false).await.unwrap();
    let sent = router.calls_to(command::QUEUE_SET);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].get(".id"), Some("*1"));
    assert_eq!(sent[0].get("disabled"), Some("true"));
    // Still on until the next pass says otherwise.
    assert_eq!(monitor.snapshot().queues.is_enabled("*1"), Some(true));

    let err = monitor.set_queue_state("*404", true).await.unwrap_err();
    assert!(matches!(err, CoreError::QueueNotFound { .. }));
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_scripts_run_by_name() {
    let router = router();
    let monitor = started(&router, config()).await;

    monitor.run_script("wake-nas").await.unwrap();
    let sent = router.calls_to(command::SCRIPT_RUN);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].get(".id"), Some("*A"));

    let err = monitor.run_script("nope").await.unwrap_err();
    assert!(matches!(err, CoreError::ScriptNotFound { .. }));
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_custom_switch_commands_are_verbatim() {
    let router = router();
    router.respond(
        "/ip/firewall/filter/print",
        vec![
            Record::new().with("invalid", "false").with("disabled", "true"),
            Record::new().with("invalid", "false").with("disabled", "false"),
        ],
    );
    let mut config = config();
    config.custom_switches.push(CustomSwitch {
        name: "block-tv".into(),
        turn_on: SwitchCommand {
            path: "/ip/firewall/filter/enable".into(),
            params: Params::new().with("numbers", "3"),
        },
        turn_off: SwitchCommand {
            path: "/ip/firewall/filter/disable".into(),
            params: Params::new().with("numbers", "3"),
        },
        state: SwitchCommand {
            path: "/ip/firewall/filter/print".into(),
            params: Params::new().with("?comment", "block-tv"),
        },
    });
    let monitor = started(&router, config).await;

    monitor.set_switch("block-tv", true).await.unwrap();
    assert_eq!(
        router.calls_to("/ip/firewall/filter/enable")[0].get("numbers"),
        Some("3")
    );
    assert!(monitor.switch_state("block-tv").await.unwrap());
    assert!(matches!(
        monitor.set_switch("missing", false).await,
        Err(CoreError::SwitchNotFound { .. })
    ));
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_commands_rejected_when_not_running() {
    let monitor = Monitor::new(config(), router());
    assert!(matches!(
        monitor.run_script("wake-nas").await,
        Err(CoreError::NotRunning)
    ));
}
