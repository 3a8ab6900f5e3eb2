//! Tests for `HttpTransport` against a mock Commvault server

#![cfg(feature = "http")]

use std::sync::Arc;

use commvault_client::{
    CommvaultError, CommvaultSession, HttpTransport, Method, SessionOptions, Transport,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(server: &MockServer) -> SessionOptions {
    SessionOptions::builder(format!("{}/webconsole/api", server.uri()))
        .username("admin")
        .password("secret")
        .build()
        .unwrap()
}

async fn mount_login(server: &MockServer) {
    // base64("secret") == "c2VjcmV0"
    Mock::given(method("POST"))
        .and(path("/webconsole/api/Login"))
        .and(body_json(json!({"username": "admin", "password": "c2VjcmV0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "QSDK tok123"})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_connect_logs_in_and_sends_token() {
    let _ = env_logger::builder().is_test(true).try_init();

    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Agent"))
        .and(query_param("clientId", "2"))
        .and(header("Authtoken", "QSDK tok123"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"agentProperties": [{"id": 1}]})),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::connect(&options(&server)).await.unwrap();
    assert!(transport.is_authenticated());

    let response = transport
        .request(Method::Get, "Agent", &[("clientId", "2")])
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap(), json!({"agentProperties": [{"id": 1}]}));
}

#[tokio::test]
async fn test_login_without_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webconsole/api/Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errList": [{"errLogMessage": "Invalid credentials"}]})),
        )
        .mount(&server)
        .await;

    let err = HttpTransport::connect(&options(&server)).await.unwrap_err();

    assert_eq!(err.status(), 401);
    assert!(err.to_string().contains("Invalid credentials"));
}

#[tokio::test]
async fn test_connect_requires_credentials() {
    let options = SessionOptions::builder("https://cv.test/").build().unwrap();
    let err = HttpTransport::connect(&options).await.unwrap_err();
    assert!(matches!(err, CommvaultError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_non_success_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Subclient/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such subclient"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Client"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&options(&server)).unwrap();

    let missing = transport
        .request(Method::Get, "Subclient/99", &[])
        .await
        .unwrap_err();
    assert!(matches!(missing, CommvaultError::TransportFailure { status: 404, .. }));
    assert!(missing.to_string().contains("no such subclient"));

    let unavailable = transport.request(Method::Get, "Client", &[]).await.unwrap_err();
    assert_eq!(unavailable.status(), 503);
}

#[tokio::test]
async fn test_logout_clears_token() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/webconsole/api/Logout"))
        .and(header("Authtoken", "QSDK tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User logged out"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::connect(&options(&server)).await.unwrap();
    transport.logout().await.unwrap();
    assert!(!transport.is_authenticated());

    // Second logout is a no-op
    transport.logout().await.unwrap();
}

#[tokio::test]
async fn test_commvault_session_end_to_end() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientProperties": [{
                "client": {"clientEntity": {
                    "clientId": 2,
                    "clientName": "web01-east",
                    "displayName": "web01-east",
                    "hostName": "web01-east.example.com"
                }}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Subclient"))
        .and(query_param("clientId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subClientProperties": [{"subClientEntity": {"subclientId": 10}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Subclient/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "App_GetSubClientPropertiesResponse": {
                "subClientProperties": [{"commonProperties": {"numberOfBackupVersions": 3}}]
            }
        })))
        .mount(&server)
        .await;

    let session = CommvaultSession::connect(&options(&server)).await.unwrap();

    let found = session
        .clients()
        .search_client_by_name("web01.example.com")
        .unwrap();
    assert_eq!(found.len(), 1);

    let info = session
        .subclients()
        .get_suclient_bkp_info_by_client_id(found[0].client_id.as_str())
        .await
        .unwrap();
    assert_eq!(
        info[0].properties(),
        Some(&json!([{"commonProperties": {"numberOfBackupVersions": 3}}]))
    );
    assert!(Arc::strong_count(session.transport()) >= 3);
}

#[tokio::test]
async fn test_xml_reply_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webconsole/api/Agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<App_GetAgentPropertiesResponse><agentProperties><idaEntity clientId="2"/></agentProperties></App_GetAgentPropertiesResponse>"#,
            "application/xml",
        ))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&options(&server)).unwrap();
    let response = transport
        .request(Method::Get, "Agent", &[("clientId", "2")])
        .await
        .unwrap();

    assert_eq!(
        response.json().unwrap(),
        json!({"App_GetAgentPropertiesResponse": {
            "agentProperties": {"idaEntity": {"@clientId": "2"}}
        }})
    );
}
