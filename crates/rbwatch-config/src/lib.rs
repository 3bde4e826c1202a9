//! Configuration for the rbwatch CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `rbwatch_core::MonitorConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rbwatch_core::config::{DEFAULT_CLIENT_NAME, DEFAULT_SCAN_INTERVAL, DEFAULT_TIMEOUT};
use rbwatch_core::{
    CustomSwitch, MonitorConfig, Params, SensorKind, SwitchCommand, TlsVerification, TrafficUnit,
};

/// Keyring service name for stored router passwords.
pub const KEYRING_SERVICE: &str = "rbwatch";

/// Username used when a profile names none. Matches the read-only API
/// group account most RouterOS setups create for monitoring.
pub const DEFAULT_USERNAME: &str = "api_read";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: `requested`, else the configured
    /// default, else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Refresh period, humantime syntax (`"30s"`, `"2m"`).
    #[serde(default = "default_scan_interval")]
    pub scan_interval: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_scan_interval() -> String {
    humantime::format_duration(DEFAULT_SCAN_INTERVAL).to_string()
}
fn default_traffic() -> Vec<String> {
    vec!["active".into()]
}

/// A named router profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Router base URL (e.g., "https://192.168.88.1").
    pub url: String,

    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate checks. Unset means accept the router's
    /// self-signed certificate; `false` means verify against system roots.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override refresh period.
    pub scan_interval: Option<String>,

    /// Display name, also the prefix of every sensor id.
    pub name: Option<String>,

    /// Traffic unit symbol: b/s, B/s, Kb/s, KB/s, Mb/s, MB/s.
    pub unit: Option<String>,

    /// Hosts and CIDR networks to report on.
    #[serde(default)]
    pub monitored_addresses: Vec<String>,

    /// Sensor kinds: active, upload, download, local.
    #[serde(default = "default_traffic")]
    pub monitored_traffic: Vec<String>,

    #[serde(default)]
    pub expand_network_hosts: bool,

    #[serde(default)]
    pub manage_queues: bool,

    /// Script environment variables to expose.
    #[serde(default)]
    pub tracked_variables: Vec<String>,

    #[serde(default)]
    pub switches: Vec<SwitchProfile>,
}

/// A custom switch defined by three raw router commands.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SwitchProfile {
    pub name: String,
    pub turn_on: CommandProfile,
    pub turn_off: CommandProfile,
    pub state: CommandProfile,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandProfile {
    /// Menu path, e.g. `/ip/firewall/filter/disable`.
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl From<&CommandProfile> for SwitchCommand {
    fn from(cmd: &CommandProfile) -> Self {
        let mut params = Params::new();
        for (key, value) in &cmd.params {
            params.insert(key.as_str(), value);
        }
        Self {
            path: cmd.path.clone(),
            params,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "rbwatch", "rbwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rbwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `RBWATCH_PROFILES__HOME__URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RBWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

pub fn resolve_username(profile: &Profile) -> String {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("RBWATCH_USERNAME").ok())
        .unwrap_or_else(|| DEFAULT_USERNAME.into())
}

/// Resolve the password from the credential chain (no CLI flag step).
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("RBWATCH_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_unit(raw: &str) -> Result<TrafficUnit, ConfigError> {
    raw.parse()
        .map_err(|_| invalid("unit", format!("expected one of b/s, B/s, Kb/s, KB/s, Mb/s, MB/s, got '{raw}'")))
}

pub fn parse_traffic(raw: &[String]) -> Result<Vec<SensorKind>, ConfigError> {
    raw.iter()
        .map(|kind| {
            kind.parse().map_err(|_| {
                invalid(
                    "monitored_traffic",
                    format!("expected active, upload, download or local, got '{kind}'"),
                )
            })
        })
        .collect()
}

pub fn parse_interval(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| invalid(field, format!("'{raw}': {e}")))
}

fn tls_for(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        // RouterOS ships a self-signed certificate
        (None, None) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Build a `MonitorConfig` from a profile, with no CLI overrides.
pub fn profile_to_monitor_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<MonitorConfig, ConfigError> {
    let url: url::Url = profile
        .url
        .parse()
        .map_err(|_| invalid("url", format!("invalid URL: {}", profile.url)))?;

    let password = resolve_password(profile, profile_name)?;
    let mut config = MonitorConfig::new(url, resolve_username(profile), password);

    config.tls = tls_for(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.scan_interval = parse_interval(
        "scan_interval",
        profile.scan_interval.as_deref().unwrap_or(&defaults.scan_interval),
    )?;
    config.client_name = profile
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_CLIENT_NAME.into());
    if let Some(ref unit) = profile.unit {
        config.traffic_unit = parse_unit(unit)?;
    }
    config.monitored_addresses.clone_from(&profile.monitored_addresses);
    config.monitored_traffic = parse_traffic(&profile.monitored_traffic)?;
    config.expand_network_hosts = profile.expand_network_hosts;
    config.manage_queues = profile.manage_queues;
    config.tracked_variables.clone_from(&profile.tracked_variables);
    config.custom_switches = profile
        .switches
        .iter()
        .map(|s| CustomSwitch {
            name: s.name.clone(),
            turn_on: (&s.turn_on).into(),
            turn_off: (&s.turn_off).into(),
            state: (&s.state).into(),
        })
        .collect();

    Ok(config)
}
