// RouterOS REST API client
//
// RouterOS v7 exposes every console command over HTTP(S) at
// `/rest/<menu path>`. A POST to `/rest/ip/address/print` behaves like
// `/ip address print` on the console; parameters travel as a flat JSON
// object, and the reply is a JSON array of flat objects (or a single
// object, or nothing). Authentication is HTTP basic on every request.

use std::sync::Arc;

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::RouterClient;
use crate::error::Error;
use crate::record::{Params, Record};
use crate::transport::TransportConfig;

/// Command used to verify credentials after a reconnect.
const IDENTITY_PATH: &str = "/system/identity/print";

/// HTTP client for a single router's REST gateway.
///
/// The inner `reqwest::Client` sits behind an `ArcSwap` so that
/// [`reconnect`](RouterClient::reconnect) can replace it (dropping any
/// pooled, possibly half-dead connections) through a shared reference.
pub struct RestClient {
    http: ArcSwap<reqwest::Client>,
    base_url: Url,
    username: String,
    password: SecretString,
    transport: TransportConfig,
}

/// Error body RouterOS sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct RouterErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

impl RestClient {
    /// Create a client for the router at `base_url` (e.g. `https://192.168.88.1`).
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http: ArcSwap::from_pointee(http),
            base_url,
            username: username.into(),
            password,
            transport,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// Reconnects still rebuild from the default [`TransportConfig`].
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            http: ArcSwap::from_pointee(http),
            base_url,
            username: username.into(),
            password,
            transport: TransportConfig::default(),
        }
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The user the client authenticates as.
    pub fn username(&self) -> &str {
        &self.username
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/rest/{path}` with the menu path's leading slash folded in.
    pub(crate) fn command_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/rest/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post(&self, path: &str, params: &Params) -> Result<Vec<Record>, Error> {
        let url = self.command_url(path)?;
        debug!(%url, %params, "POST");

        let http = self.http.load_full();
        let resp = http
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(params)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.parse_response(resp).await
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.transport.timeout_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn parse_response(&self, resp: reqwest::Response) -> Result<Vec<Record>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("router rejected credentials for user '{}'", self.username),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            let parsed: Option<RouterErrorBody> = serde_json::from_str(&body).ok();
            let (message, detail) = match parsed {
                Some(b) => (b.message, b.detail),
                None => (None, None),
            };
            return Err(Error::Router {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown").to_owned()
                }),
                detail,
            });
        }

        parse_records(&body)
    }
}

/// Turn a successful response body into records.
fn parse_records(body: &str) -> Result<Vec<Record>, Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let deser_err = |e: serde_json::Error| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    };

    let value: Value = serde_json::from_str(body).map_err(deser_err)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value::<Record>)
            .collect::<Result<_, _>>()
            .map_err(deser_err),
        obj @ Value::Object(_) => Ok(vec![serde_json::from_value(obj).map_err(deser_err)?]),
        other => Err(Error::Deserialization {
            message: format!("expected a JSON array or object, got {other}"),
            body: body.to_owned(),
        }),
    }
}

impl RouterClient for RestClient {
    async fn issue(&self, path: &str, params: &Params) -> Result<Vec<Record>, Error> {
        self.post(path, params).await
    }

    async fn reconnect(&self) -> Result<(), Error> {
        let fresh = self.transport.build_client()?;
        self.http.store(Arc::new(fresh));

        let identity = self.post(IDENTITY_PATH, &Params::new()).await?;
        debug!(
            identity = identity.first().and_then(|r| r.get("name")).unwrap_or("?"),
            "router session established"
        );
        Ok(())
    }
}
