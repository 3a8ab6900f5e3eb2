//! Unit tests for `ClientSession`
//!
//! Tests client listing, id lookup across schema versions, client
//! properties and name search

use std::sync::Arc;
use std::time::Duration;

use commvault_client::{
    CachedMethod, ClientRecord, ClientSession, CommvaultError, MethodCache, SessionOptions,
    StubTransport,
};
use serde_json::{Value, json};

fn options() -> SessionOptions {
    SessionOptions::builder("https://commserve.test/webconsole/api")
        .build()
        .unwrap()
}

fn client(id: u64, name: &str, host: &str) -> Value {
    json!({
        "client": {
            "clientEntity": {
                "clientId": id,
                "clientName": name,
                "displayName": name.to_uppercase(),
                "hostName": host
            }
        }
    })
}

fn legacy_client(id: &str, name: &str) -> Value {
    json!({
        "client": {
            "clientEntity": {
                "@clientId": id,
                "clientName": name,
                "displayName": name,
                "hostName": format!("{name}.example.com")
            }
        }
    })
}

fn stub_with_clients(clients: Vec<Value>) -> Arc<StubTransport> {
    let transport = Arc::new(StubTransport::new());
    transport.respond_json("Client", &[], json!({ "clientProperties": clients }));
    transport
}

fn fleet() -> Vec<Value> {
    vec![
        client(2, "web01-east", "web01-east.example.com"),
        client(3, "Web01-West", "web01-west.example.com"),
        client(4, "db01", "db01.example.com"),
    ]
}

#[tokio::test]
async fn test_construction_builds_lowercase_index() {
    let _ = env_logger::builder().is_test(true).try_init();

    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();
    let index = session.clients_index();

    assert_eq!(index.len(), 3);
    assert_eq!(
        index.keys().collect::<Vec<_>>(),
        vec!["db01", "web01-east", "web01-west"]
    );
    assert_eq!(
        index.get("WEB01-WEST"),
        Some(&ClientRecord {
            client_id: "3".to_string(),
            client_name: "Web01-West".to_string(),
            display_name: "WEB01-WEST".to_string(),
            host_name: "web01-west.example.com".to_string(),
        })
    );
}

#[tokio::test]
async fn test_construction_fails_without_clients() {
    let transport = Arc::new(StubTransport::new());
    transport.respond_json("Client", &[], json!({"clientProperties": []}));

    let err = ClientSession::new(transport, &options()).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No clients found in Commvault");
}

#[tokio::test]
async fn test_construction_reports_transport_error_as_not_found() {
    let transport = Arc::new(StubTransport::new());
    transport.fail("Client", &[], CommvaultError::transport("connection refused"));

    let err = ClientSession::new(transport, &options()).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status(), 404);
    assert_eq!(
        err.to_string(),
        "Fail to get clients list from Commvault - connection refused"
    );
}

#[tokio::test]
async fn test_get_clients_after_construction_keeps_transport_status() {
    let transport = stub_with_clients(fleet());
    let session = ClientSession::with_cache(
        transport.clone(),
        MethodCache::new(Vec::<CachedMethod>::new(), Duration::ZERO, 1),
    )
    .await
    .unwrap();

    transport.respond_status("Client", &[], 503, "unavailable");
    let err = session.get_clients().await.unwrap_err();

    assert_eq!(err.status(), 500);
    assert!(err.to_string().starts_with("Fail to get clients list from Commvault"));
}

#[tokio::test]
async fn test_get_clients_is_cached() {
    let transport = stub_with_clients(fleet());
    let session = ClientSession::new(transport.clone(), &options())
        .await
        .unwrap();

    let clients = session.get_clients().await.unwrap();

    assert_eq!(clients.len(), 3);
    assert_eq!(transport.request_count("Client"), 1);
}

#[tokio::test]
async fn test_get_client_by_current_key() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    let found = session.get_client("4").await.unwrap();

    assert_eq!(found, client(4, "db01", "db01.example.com"));
}

#[tokio::test]
async fn test_get_client_by_legacy_key() {
    let session = ClientSession::new(
        stub_with_clients(vec![legacy_client("8", "old01"), legacy_client("9", "old02")]),
        &options(),
    )
    .await
    .unwrap();

    let found = session.get_client("9").await.unwrap();

    assert_eq!(found, legacy_client("9", "old02"));
}

#[tokio::test]
async fn test_get_client_same_record_for_either_schema() {
    let current = ClientSession::new(
        stub_with_clients(vec![json!({"client": {"clientEntity": {"clientId": 5, "clientName": "x"}}})]),
        &options(),
    )
    .await
    .unwrap();
    let legacy = ClientSession::new(
        stub_with_clients(vec![json!({"client": {"clientEntity": {"@clientId": "5", "clientName": "x"}}})]),
        &options(),
    )
    .await
    .unwrap();

    let a = current.get_client("5").await.unwrap();
    let b = legacy.get_client("5").await.unwrap();

    assert_eq!(a["client"]["clientEntity"]["clientName"], "x");
    assert_eq!(b["client"]["clientEntity"]["clientName"], "x");
    assert_eq!(
        current.clients_index().get("x"),
        legacy.clients_index().get("x")
    );
}

#[tokio::test]
async fn test_get_client_unknown_id_is_not_found() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    for id in ["1", "40", "web01-east", ""] {
        let err = session.get_client(id).await.unwrap_err();
        assert!(err.is_not_found(), "{id} should not be found");
    }
    assert_eq!(
        session.get_client("1").await.unwrap_err().to_string(),
        "Client 1 not in client list."
    );
}

#[tokio::test]
async fn test_get_client_accepts_integer_id() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    assert_eq!(
        session.get_client(2u32).await.unwrap(),
        session.get_client("2").await.unwrap()
    );
}

#[tokio::test]
async fn test_get_client_properties() {
    let transport = stub_with_clients(fleet());
    transport
        .respond_json("Client/2", &[], json!({"clientProperties": [{"clientProps": {"x": 1}}]}))
        .respond_json("Client/3", &[], json!({"clientProperties": []}))
        .fail("Client/4", &[], CommvaultError::transport_failure(502, "bad gateway"));
    let session = ClientSession::new(transport.clone(), &options())
        .await
        .unwrap();

    let props = session.get_client_properties("2").await.unwrap();
    assert_eq!(props, json!([{"clientProps": {"x": 1}}]));
    session.get_client_properties("2").await.unwrap();
    assert_eq!(transport.request_count("Client/2"), 1);

    let empty = session.get_client_properties("3").await.unwrap_err();
    assert!(empty.is_not_found());
    assert_eq!(empty.to_string(), "No client properties found for client 3");

    let failed = session.get_client_properties("4").await.unwrap_err();
    assert_eq!(failed.status(), 500);
    assert!(failed.to_string().contains("bad gateway"));
}

#[tokio::test]
async fn test_search_client_by_name_uses_first_label() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    let found = session.search_client_by_name("WEB01.example.com").unwrap();

    let names: Vec<_> = found.iter().map(|c| c.client_name.as_str()).collect();
    assert_eq!(names, vec!["web01-east", "Web01-West"]);
}

#[tokio::test]
async fn test_search_client_by_name_substring() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    let found = session.search_client_by_name("web01-e").unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].client_id, "2");
    assert_eq!(found[0].host_name, "web01-east.example.com");
}

#[tokio::test]
async fn test_search_client_by_name_invalid_pattern_matches_literally() {
    let session = ClientSession::new(
        stub_with_clients(vec![client(11, "app(1", "app.example.com")]),
        &options(),
    )
    .await
    .unwrap();

    let found = session.search_client_by_name("app(1.example.com").unwrap();
    assert_eq!(found[0].client_id, "11");
}

#[tokio::test]
async fn test_search_client_by_name_no_match_is_not_found() {
    let session = ClientSession::new(stub_with_clients(fleet()), &options())
        .await
        .unwrap();

    let err = session.search_client_by_name("mail01.example.com").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No clients found for host mail01.example.com");
}

#[tokio::test]
async fn test_single_client_object_is_normalized_to_list() {
    let transport = Arc::new(StubTransport::new());
    transport.respond_json(
        "Client",
        &[],
        json!({"clientProperties": client(1, "solo", "solo.example.com")}),
    );

    let session = ClientSession::new(transport, &options()).await.unwrap();

    assert_eq!(session.get_clients().await.unwrap().len(), 1);
    assert_eq!(session.clients_index().len(), 1);
}
