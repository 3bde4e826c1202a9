//! CLI configuration: thin wrapper around `rbwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --username, --password, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use rbwatch_core::{MonitorConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use rbwatch_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `MonitorConfig` from the config file, profile, and CLI overrides.
pub fn build_monitor_config(global: &GlobalOpts) -> Result<MonitorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg, global),
        None if global.url.is_some() => {
            // No profile: a bare profile built from flags / env alone.
            let profile = Profile {
                monitored_traffic: vec!["active".into()],
                ..Profile::default()
            };
            resolve_profile(&profile, &profile_name, &cfg, global)
        }
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        }),
        None => Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        }),
    }
}

/// Translate a `Profile` + global flags into a `MonitorConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<MonitorConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if profile.url.is_empty() {
        return Err(CliError::Validation {
            field: "url".into(),
            reason: format!("profile '{profile_name}' has no router URL"),
        });
    }

    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
    }

    let mut config =
        rbwatch_config::profile_to_monitor_config(&profile, profile_name, &cfg.defaults)?;

    // The flag beats the keyring.
    if let Some(ref password) = global.password {
        config.password = SecretString::from(password.clone());
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
