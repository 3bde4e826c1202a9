//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rbwatch_config::ConfigError;
use rbwatch_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const ROUTER_CONFIG: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to router at {url}")]
    #[diagnostic(
        code(rbwatch::connection_failed),
        help(
            "Check that the router is reachable and the www-ssl service is enabled.\n\
             URL: {url}\n\
             Try: rbwatch hosts --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Router API error: {message}")]
    #[diagnostic(code(rbwatch::api_error))]
    ApiError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(rbwatch::auth_failed),
        help(
            "Verify the username and that its group has the 'api' and 'read' policies.\n\
             Run: rbwatch config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(rbwatch::no_credentials),
        help(
            "Configure credentials with: rbwatch config init\n\
             Or set the RBWATCH_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Router configuration ─────────────────────────────────────────
    #[error("IP accounting is disabled on the router")]
    #[diagnostic(
        code(rbwatch::accounting_disabled),
        help("Enable it on the router: /ip accounting set enabled=yes")
    )]
    AccountingDisabled,

    #[error("{operation} is disabled")]
    #[diagnostic(
        code(rbwatch::disabled),
        help("Set {setting} = true in the profile to allow it.")
    )]
    Disabled { operation: String, setting: String },

    #[error("Router busy: command slot unavailable after {attempts} attempts")]
    #[diagnostic(code(rbwatch::busy), help("Another command is in flight. Try again."))]
    Busy { attempts: u32 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(rbwatch::not_found),
        help("Run: rbwatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rbwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rbwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: rbwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No router configured")]
    #[diagnostic(
        code(rbwatch::no_config),
        help(
            "Create a profile with: rbwatch config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(rbwatch::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(rbwatch::timeout),
        help("Increase timeout with --timeout or check router load.")
    )]
    Timeout { seconds: u64 },

    // ── IO / internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(rbwatch::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ApiError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AccountingDisabled | Self::Disabled { .. } => exit_code::ROUTER_CONFIG,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::Busy { .. } | Self::Io(_) | Self::Internal(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { .. } => Self::AuthFailed {
                profile: "current".into(),
            },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AccountingDisabled => Self::AccountingDisabled,
            CoreError::Disabled { operation, setting } => Self::Disabled { operation, setting },
            CoreError::BackoffExhausted { attempts } => Self::Busy { attempts },
            CoreError::QueueNotFound { identifier } => Self::NotFound {
                resource_type: "queue".into(),
                identifier,
                list_command: "queues list".into(),
            },
            CoreError::ScriptNotFound { name } => Self::NotFound {
                resource_type: "script".into(),
                identifier: name,
                list_command: "scripts list".into(),
            },
            CoreError::SwitchNotFound { name } => Self::NotFound {
                resource_type: "switch".into(),
                identifier: name,
                list_command: "switches list".into(),
            },
            CoreError::Api { message, .. } => Self::ApiError { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Parse { entity, reason } => {
                Self::Internal(format!("malformed {entity}: {reason}"))
            }
            CoreError::NotRunning => Self::Internal("monitor is not running".into()),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}
