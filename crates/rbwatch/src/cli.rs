//! Clap derive structures for the `rbwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rbwatch -- per-host traffic and lease monitoring for MikroTik routers
#[derive(Debug, Parser)]
#[command(
    name = "rbwatch",
    version,
    about = "Watch traffic, DHCP leases and queues on a MikroTik router",
    long_about = "Reads IP accounting snapshots, the DHCP lease table and simple queues\n\
        over the RouterOS REST API and reports per-host and per-network rates.\n\n\
        IP accounting must be enabled on the router (/ip accounting set enabled=yes).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "RBWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router URL (overrides profile)
    #[arg(long, short = 'u', env = "RBWATCH_URL", global = true)]
    pub url: Option<String>,

    /// API username (overrides profile)
    #[arg(long, env = "RBWATCH_USERNAME", global = true)]
    pub username: Option<String>,

    /// API password
    #[arg(long, env = "RBWATCH_PASSWORD", global = true, hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RBWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "RBWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "RBWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Take one measurement and print every configured sensor
    #[command(alias = "s")]
    Sensors(SensorsArgs),

    /// Keep polling and print sensors after every refresh
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List DHCP leases
    #[command(alias = "leases")]
    Hosts,

    /// List and toggle simple queues
    #[command(alias = "q")]
    Queues(QueuesArgs),

    /// Operate custom switches defined in the profile
    Switches(SwitchesArgs),

    /// List and run router scripts
    Scripts(ScriptsArgs),

    /// Show tracked script environment variables
    #[command(alias = "vars")]
    Variables,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sensors / Watch ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SensorsArgs {
    /// How long to accumulate traffic before reading rates
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub sample: Duration,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh period (overrides profile scan_interval)
    #[arg(long, short = 'i', value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Stop after this many refreshes
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

// ── Queues ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QueuesArgs {
    #[command(subcommand)]
    pub command: QueuesCommand,
}

#[derive(Debug, Subcommand)]
pub enum QueuesCommand {
    /// List simple queues
    #[command(alias = "ls")]
    List,

    /// Enable a queue (id or name)
    Enable { queue: String },

    /// Disable a queue (id or name)
    Disable { queue: String },
}

// ── Switches ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SwitchesArgs {
    #[command(subcommand)]
    pub command: SwitchesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SwitchesCommand {
    /// List custom switches and their current state
    #[command(alias = "ls")]
    List,

    /// Turn a switch on
    On { name: String },

    /// Turn a switch off
    Off { name: String },

    /// Query a switch's state
    State { name: String },
}

// ── Scripts ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScriptsArgs {
    #[command(subcommand)]
    pub command: ScriptsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScriptsCommand {
    /// List scripts on the router
    #[command(alias = "ls")]
    List,

    /// Run a script by name
    Run { name: String },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store a router password in the system keyring
    SetPassword {
        /// Profile to store it for (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
