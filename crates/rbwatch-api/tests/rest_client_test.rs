#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rbwatch_api::{Error, Params, RestClient, RouterClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "api_read",
        SecretString::from("api_read".to_owned()),
    );
    (server, client)
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_print_returns_records() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/dhcp-server/lease/print"))
        .and(basic_auth("api_read", "api_read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                ".id": "*1",
                "address": "192.168.88.10",
                "mac-address": "AA:BB:CC:DD:EE:01",
                "host-name": "laptop",
                "status": "bound"
            },
            {
                ".id": "*2",
                "address": "192.168.88.11",
                "status": "waiting",
                "disabled": false
            }
        ])))
        .mount(&server)
        .await;

    let rows = client
        .issue("/ip/dhcp-server/lease/print", &Params::new())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("host-name"), Some("laptop"));
    assert_eq!(rows[1].get("status"), Some("waiting"));
    assert_eq!(rows[1].get_bool("disabled"), Some(false));
}

#[tokio::test]
async fn test_set_sends_params_as_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/queue/simple/set"))
        .and(body_json(json!({ ".id": "*7", "disabled": "true" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let params = Params::new().with(".id", "*7").with("disabled", true);
    let rows = client.issue("/queue/simple/set", &params).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_empty_body_yields_no_records() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/accounting/snapshot/take"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let rows = client
        .issue("/ip/accounting/snapshot/take", &Params::new())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": 401,
            "message": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let result = client.issue("/queue/simple/print", &Params::new()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_router_error_body_is_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/queue/simple/set"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": 400,
            "message": "Bad Request",
            "detail": "no such item"
        })))
        .mount(&server)
        .await;

    let err = client
        .issue("/queue/simple/set", &Params::new().with(".id", "*99"))
        .await
        .unwrap_err();

    match err {
        Error::Router {
            status,
            ref message,
            ref detail,
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Bad Request");
            assert_eq!(detail.as_deref(), Some("no such item"));
        }
        other => panic!("expected Router error, got {other:?}"),
    }
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_status_reason() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client
        .issue("/ip/accounting/print", &Params::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Router { status: 500, ref message, detail: None } if message == "Internal Server Error"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{broken"))
        .mount(&server)
        .await;

    let err = client
        .issue("/ip/accounting/print", &Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "{broken"));
}

// ── Reconnect ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconnect_verifies_identity() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/system/identity/print"))
        .and(basic_auth("api_read", "api_read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "MikroTik" })))
        .expect(1)
        .mount(&server)
        .await;

    client.reconnect().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_surfaces_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/system/identity/print"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.reconnect().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and immediately drop a server so the port is closed.
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = RestClient::with_client(
        reqwest::Client::new(),
        Url::parse(&uri).unwrap(),
        "api",
        SecretString::from("x".to_owned()),
    );
    let err = client
        .issue("/ip/accounting/print", &Params::new())
        .await
        .unwrap_err();
    assert!(err.is_transient(), "expected transient error, got {err:?}");
}
