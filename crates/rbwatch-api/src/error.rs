use thiserror::Error;

/// Top-level error type for the `rbwatch-api` crate.
///
/// Covers every failure mode of the command boundary: authentication,
/// transport, router-side rejections, and malformed response bodies.
/// `rbwatch-core` maps these into domain diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, disabled user, missing policy).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Router ──────────────────────────────────────────────────────
    /// The router rejected the command (parsed from the
    /// `{error, message, detail}` body RouterOS sends on failure).
    #[error("Router error (HTTP {status}): {message}")]
    Router {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body was not the JSON shape we expected.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the router reported an unknown menu or item.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Router { status: 404, .. } => true,
            Self::Router { detail, .. } => detail
                .as_deref()
                .is_some_and(|d| d.contains("no such item") || d.contains("no such command")),
            _ => false,
        }
    }
}
