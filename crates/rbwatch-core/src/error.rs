// ── Core error types ──
//
// User-facing errors from rbwatch-core. These are NOT transport-specific:
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<rbwatch_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Monitor is not running")]
    NotRunning,

    // ── Router configuration errors ──────────────────────────────────
    /// IP accounting is switched off on the router. Nothing can be
    /// measured until an operator enables it.
    #[error("IP accounting is not enabled on the router")]
    AccountingDisabled,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed {entity} row: {reason}")]
    Parse { entity: &'static str, reason: String },

    #[error("Queue not found: {identifier}")]
    QueueNotFound { identifier: String },

    #[error("Script not found: {name}")]
    ScriptNotFound { name: String },

    #[error("Switch not found: {name}")]
    SwitchNotFound { name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Command slot busy after {attempts} attempts")]
    BackoffExhausted { attempts: u32 },

    #[error("Operation not enabled: {operation} (set {setting} in the profile)")]
    Disabled { operation: String, setting: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Router API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn parse(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            entity,
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rbwatch_api::Error> for CoreError {
    fn from(err: rbwatch_api::Error) -> Self {
        match err {
            rbwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            rbwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            rbwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            rbwatch_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            rbwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            rbwatch_api::Error::Router {
                status,
                message,
                detail,
            } => CoreError::Api {
                message: match detail {
                    Some(detail) => format!("{message}: {detail}"),
                    None => message,
                },
                status: Some(status),
            },
            rbwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
