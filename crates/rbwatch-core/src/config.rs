// ── Runtime monitor configuration ──
//
// These types describe *what* to watch on a router and *how* to reach it.
// They never touch disk: the CLI builds a `MonitorConfig` from its profile
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use rbwatch_api::transport::{TlsMode, TransportConfig};
use rbwatch_api::{Params, RestClient};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::SensorKind;
use crate::units::TrafficUnit;

pub const DEFAULT_CLIENT_NAME: &str = "RouterBoard";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. RouterOS ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// One verbatim router command: a menu path plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCommand {
    pub path: String,
    pub params: Params,
}

/// A user-defined switch backed by three arbitrary commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSwitch {
    pub name: String,
    pub turn_on: SwitchCommand,
    pub turn_off: SwitchCommand,
    pub state: SwitchCommand,
}

/// Configuration for monitoring a single router.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Router URL (e.g., `https://192.168.88.1`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Gap between background refresh passes. Zero disables the timer.
    pub scan_interval: Duration,
    /// Prefix for sensor and switch identifiers.
    pub client_name: String,
    pub traffic_unit: TrafficUnit,
    /// Hosts (`10.0.0.5`) and networks (`10.0.0.0/24`) to report on.
    pub monitored_addresses: Vec<String>,
    pub monitored_traffic: Vec<SensorKind>,
    /// Also report every leased host inside a monitored network.
    pub expand_network_hosts: bool,
    /// Allow queue enable/disable commands.
    pub manage_queues: bool,
    pub custom_switches: Vec<CustomSwitch>,
    /// Script environment variables to expose; none means the stage is skipped.
    pub tracked_variables: Vec<String>,
}

impl MonitorConfig {
    /// A config with defaults for everything but the connection details.
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            client_name: DEFAULT_CLIENT_NAME.into(),
            traffic_unit: TrafficUnit::default(),
            monitored_addresses: Vec::new(),
            monitored_traffic: vec![SensorKind::Active],
            expand_network_hosts: false,
            manage_queues: false,
            custom_switches: Vec::new(),
            tracked_variables: Vec::new(),
        }
    }

    pub fn custom_switch(&self, name: &str) -> Option<&CustomSwitch> {
        self.custom_switches.iter().find(|s| s.name == name)
    }

    /// Build a [`TransportConfig`] from the TLS and timeout settings.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    /// A REST client for this router. Does not contact it.
    pub fn rest_client(&self) -> Result<RestClient, CoreError> {
        Ok(RestClient::new(
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
            self.transport(),
        )?)
    }
}
