//! Config subcommand handlers.

use dialoguer::{Confirm, Input, MultiSelect, Select};
use strum::IntoEnumIterator;

use rbwatch_core::{SensorKind, TrafficUnit};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const REDACTED: &str = "********";

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

fn store_in_keyring(profile_name: &str, secret: &str) -> Result<(), CliError> {
    rbwatch_config::store_password(profile_name, secret).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store password in keyring: {e}"),
    })
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("rbwatch: configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Router URL")
        .default("https://192.168.88.1".into())
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("API username")
        .default(rbwatch_config::DEFAULT_USERNAME.into())
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let password = if store_selection == 0 {
        store_in_keyring(&profile_name, &password)?;
        eprintln!("   Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    let addresses: String = Input::new()
        .with_prompt("Hosts or networks to monitor (comma separated, blank for none)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let monitored_addresses = addresses
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect();

    let kinds: Vec<SensorKind> = SensorKind::iter().collect();
    let kind_labels: Vec<&'static str> = kinds.iter().map(|k| (*k).into()).collect();
    let defaults: Vec<bool> = kinds.iter().map(|k| *k == SensorKind::Active).collect();
    let picked = MultiSelect::new()
        .with_prompt("Traffic to report")
        .items(&kind_labels)
        .defaults(&defaults)
        .interact()
        .map_err(prompt_err)?;
    let monitored_traffic = picked.iter().map(|&i| kind_labels[i].to_owned()).collect();

    let units: Vec<TrafficUnit> = TrafficUnit::iter().collect();
    let unit_labels: Vec<&'static str> = units.iter().map(|u| u.symbol()).collect();
    let default_unit = units
        .iter()
        .position(|u| *u == TrafficUnit::default())
        .unwrap_or_default();
    let unit = Select::new()
        .with_prompt("Traffic unit")
        .items(&unit_labels)
        .default(default_unit)
        .interact()
        .map_err(prompt_err)?;

    let manage_queues = Confirm::new()
        .with_prompt("Allow enabling/disabling simple queues?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let profile = Profile {
        url,
        username: Some(username),
        password,
        unit: Some(unit_labels[unit].to_owned()),
        monitored_addresses,
        monitored_traffic,
        manage_queues,
        ..Profile::default()
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: rbwatch hosts");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |c| config::active_profile_name(global, c),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            store_in_keyring(&profile_name, &secret)?;
            eprintln!("Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_hides_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: "https://192.168.88.1".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = format!("{:?}", redacted(&cfg));
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains(REDACTED));
    }
}
