//! End-to-end tests of the admin client against a mock SOAP endpoint.

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zimbra_admin::AdminClient;
use zimbra_core::attrs::AttributeMap;
use zimbra_core::config::ZimbraClientConfig;
use zimbra_core::Error;

const SOAP_PATH: &str = "/service/admin/soap";

fn envelope(body: Value) -> Value {
    json!({
        "Header": {"context": {"_jsns": "urn:zimbra"}},
        "Body": body,
        "_jsns": "urn:zimbraSoap"
    })
}

fn fault(code: &str, text: &str) -> Value {
    envelope(json!({"Fault": {
        "Code": {"Value": "soap:Sender"},
        "Reason": {"Text": text},
        "Detail": {"Error": {"Code": code, "_jsns": "urn:zimbra"}}
    }}))
}

fn client_for(server: &MockServer) -> AdminClient {
    let config = ZimbraClientConfig::new(server.uri(), "admin@example.test", "secret").unwrap();
    AdminClient::new(&config).unwrap()
}

async fn mount_auth(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"AuthRequest": {
            "_jsns": "urn:zimbraAdmin",
            "name": "admin@example.test",
            "password": "secret"
        }}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "AuthResponse": {
                "_jsns": "urn:zimbraAdmin",
                "authToken": [{"_content": "0_admin"}],
                "lifetime": 43_200_000
            }
        }))))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn create_and_remove_domain() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({
            "Header": {"context": {"authToken": {"_content": "0_admin"}, "format": {"type": "js"}}},
            "Body": {"CreateDomainRequest": {
                "_jsns": "urn:zimbraAdmin",
                "name": {"_content": "example.test"},
                "a": [{"n": "description", "_content": "x"}]
            }}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "CreateDomainResponse": {
                "_jsns": "urn:zimbraAdmin",
                "domain": [{
                    "name": "example.test",
                    "id": "7c4b9f0e-3f2d-4b6a-9a1e-5d8c2b7e4f10",
                    "a": [
                        {"n": "description", "_content": "x"},
                        {"n": "zimbraDomainType", "_content": "local"}
                    ]
                }]
            }
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"DeleteDomainRequest": {
            "id": "7c4b9f0e-3f2d-4b6a-9a1e-5d8c2b7e4f10"
        }}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "DeleteDomainResponse": {"_jsns": "urn:zimbraAdmin"}
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let domain = client
        .create_domain("example.test", &AttributeMap::new().with("description", "x"))
        .await
        .unwrap();
    assert_eq!(domain.name, "example.test");
    assert_eq!(domain.attrs.get_str("description"), Some("x"));
    assert!(!domain.is_alias_domain);

    let ack = client.remove_domain(&domain.id).await.unwrap();
    assert_eq!(ack["_jsns"], "urn:zimbraAdmin");
}

#[tokio::test]
async fn fault_becomes_service_error() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"CreateDomainRequest": {}}})))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(fault("account.DOMAIN_EXISTS", "domain already exists: example.test")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .create_domain("example.test", &AttributeMap::new())
        .await
        .unwrap_err();
    let Error::Fault(info) = &err else {
        panic!("expected a fault, got {err:?}");
    };
    assert_eq!(info.status, 500);
    assert_eq!(info.code(), "account.DOMAIN_EXISTS");
    assert_eq!(info.title, "domain already exists: example.test");
}

#[tokio::test]
async fn non_fault_status_is_transport_error() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"GetAccountRequest": {}}})))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_account("user@example.test").await.unwrap_err();
    let Error::Transport(info) = &err else {
        panic!("expected a transport error, got {err:?}");
    };
    assert_eq!(info.status, 503);
}

#[tokio::test]
async fn failed_login_consumes_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"AuthRequest": {}}})))
        .respond_with(ResponseTemplate::new(500).set_body_json(fault(
            "account.AUTH_FAILED",
            "authentication failed for [admin@example.test]",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_account("user@example.test").await.unwrap_err();
    assert_eq!(first.info().unwrap().code(), "account.AUTH_FAILED");

    let second = client.get_account("user@example.test").await.unwrap_err();
    assert!(matches!(second, Error::AuthenticationRequired(_)));
}

#[tokio::test]
async fn set_password_rejection_is_an_error() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(SOAP_PATH))
        .and(body_partial_json(json!({"Body": {"SetPasswordRequest": {
            "id": "a1",
            "newPassword": "short"
        }}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "SetPasswordResponse": {
                "_jsns": "urn:zimbraAdmin",
                "message": [{"_content": "password is too short"}]
            }
        }))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.set_password("a1", "short").await.unwrap_err();
    assert_eq!(err.info().unwrap().title, "password is too short");
}
