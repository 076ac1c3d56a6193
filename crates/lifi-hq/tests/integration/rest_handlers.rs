//! REST API handler behavior tests
//!
//! These tests call the handlers with a real in-memory store and check the
//! JSON the operators' clients receive.

use axum::extract::{Path, Query, State};
use axum::Json;
use lifi_core::{MessageType, NodeId, NodeStatus, NodeUpdate, HQ_ID};
use lifi_hq::server::rest::{self, MessagesQuery};
use lifi_hq::AppState;
use lifi_state::SqliteStore;
use serde_json::json;
use std::sync::Arc;

use super::{json_response, test_state, test_state_with_store};

async fn record(state: &AppState, sender: &str, message_type: MessageType, content: &str) {
    state
        .store
        .record_message(&NodeId::from(sender), message_type, content)
        .await
        .unwrap();
}

// ============ Health Endpoint Tests ============

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    assert_eq!(rest::health().await, "OK");
}

// ============ Node Endpoint Tests ============

#[tokio::test]
async fn test_list_nodes_starts_with_hq() {
    let state = test_state();

    let (status, body) = json_response(rest::list_nodes(State(state)).await).await;

    assert_eq!(status, 200);
    let nodes = body.as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["id"], HQ_ID);
    assert_eq!(nodes[0]["name"], "Headquarters");
}

#[tokio::test]
async fn test_list_nodes_reflects_recorded_senders() {
    let state = test_state();
    record(&state, "102a", MessageType::Sos, "SOS").await;
    record(&state, "2b3c", MessageType::Message, "all good").await;

    let (_, body) = json_response(rest::list_nodes(State(state)).await).await;
    let nodes = body.as_array().unwrap();
    assert_eq!(nodes.len(), 3);

    let sos = nodes.iter().find(|n| n["id"] == "102a").unwrap();
    assert_eq!(sos["status"], "sos");
    assert!(sos["last_seen"].is_string());

    let active = nodes.iter().find(|n| n["id"] == "2b3c").unwrap();
    assert_eq!(active["status"], "active");
}

#[tokio::test]
async fn test_get_node_found() {
    let state = test_state();
    record(&state, "102a", MessageType::Message, "hi").await;

    let (status, body) =
        json_response(rest::get_node(State(state), Path("102a".to_string())).await).await;

    assert_eq!(status, 200);
    assert_eq!(body["id"], "102a");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_get_node_not_found() {
    let state = test_state();

    let (status, body) =
        json_response(rest::get_node(State(state), Path("ffff".to_string())).await).await;

    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "Node not found" }));
}

#[tokio::test]
async fn test_update_node_partial() {
    let state = test_state();
    record(&state, "102a", MessageType::Sos, "SOS").await;

    let update = NodeUpdate {
        name: Some("Ward 3".to_string()),
        status: Some(NodeStatus::Active),
        ..Default::default()
    };
    let (status, body) = json_response(
        rest::update_node(State(state.clone()), Path("102a".to_string()), Json(update)).await,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["name"], "Ward 3");
    assert_eq!(body["status"], "active");

    let stored = state
        .store
        .get_node(&NodeId::from("102a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Ward 3");
    assert_eq!(stored.status, NodeStatus::Active);
}

#[tokio::test]
async fn test_update_node_ignores_unknown_fields() {
    let state = test_state();
    record(&state, "102a", MessageType::Message, "hi").await;

    let update: NodeUpdate =
        serde_json::from_value(json!({ "latitude": 12.5, "colour": "red" })).unwrap();
    let (status, body) = json_response(
        rest::update_node(State(state), Path("102a".to_string()), Json(update)).await,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["latitude"], 12.5);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_update_unknown_node_not_found() {
    let state = test_state();

    let (status, body) = json_response(
        rest::update_node(
            State(state.clone()),
            Path("ffff".to_string()),
            Json(NodeUpdate::default()),
        )
        .await,
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "Node not found");
    assert!(state
        .store
        .get_node(&NodeId::from("ffff"))
        .await
        .unwrap()
        .is_none());
}

// ============ Message Endpoint Tests ============

#[tokio::test]
async fn test_list_messages_newest_first() {
    let state = test_state();
    record(&state, "102a", MessageType::Message, "first").await;
    record(&state, "102a", MessageType::Sos, "SOS").await;

    let (status, body) =
        json_response(rest::list_messages(State(state), Query(MessagesQuery::default())).await)
            .await;

    assert_eq!(status, 200);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);

    let newest = &messages[0];
    assert_eq!(newest["content"], "SOS");
    assert_eq!(newest["sender_id"], "102a");
    assert_eq!(newest["sender_name"], "Node 102a");
    assert_eq!(newest["type"], 3);
    assert_eq!(newest["type_label"], "SOS");
    assert_eq!(newest["is_emergency"], true);
    assert_eq!(messages[1]["content"], "first");
}

#[tokio::test]
async fn test_list_messages_limit() {
    let state = test_state();
    for i in 0..5 {
        record(&state, "102a", MessageType::Message, &format!("msg {i}")).await;
    }

    let query = MessagesQuery { limit: Some(1) };
    let (_, body) = json_response(rest::list_messages(State(state), Query(query)).await).await;

    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "msg 4");
}

#[tokio::test]
async fn test_list_messages_default_limit() {
    let state = test_state();
    for i in 0..60 {
        record(&state, "102a", MessageType::Message, &format!("msg {i}")).await;
    }

    let (_, body) =
        json_response(rest::list_messages(State(state), Query(MessagesQuery::default())).await)
            .await;

    assert_eq!(body.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_list_messages_bad_limit_falls_back() {
    let state = test_state();
    for i in 0..60 {
        record(&state, "102a", MessageType::Message, &format!("msg {i}")).await;
    }

    for uri in ["/api/messages?limit=abc", "/api/messages?limit=-3", "/api/messages?limit="] {
        let query: Query<MessagesQuery> = Query::try_from_uri(&uri.parse().unwrap()).unwrap();
        assert_eq!(query.limit, None, "{uri}");

        let (status, body) =
            json_response(rest::list_messages(State(state.clone()), query).await).await;
        assert_eq!(status, 200);
        assert_eq!(body.as_array().unwrap().len(), 50, "{uri}");
    }

    let query: Query<MessagesQuery> =
        Query::try_from_uri(&"/api/messages?limit=2".parse().unwrap()).unwrap();
    assert_eq!(query.limit, Some(2));
}

// ============ Stats Endpoint Tests ============

#[tokio::test]
async fn test_stats_counts() {
    let state = test_state();
    record(&state, "102a", MessageType::Sos, "SOS").await;
    record(&state, "2b3c", MessageType::Message, "ok").await;
    record(&state, "2b3c", MessageType::Message, "still ok").await;

    let (status, body) = json_response(rest::get_stats(State(state)).await).await;

    assert_eq!(status, 200);
    assert_eq!(body["total_nodes"], 3);
    assert_eq!(body["sos_nodes"], 1);
    assert_eq!(body["total_messages"], 3);
    assert_eq!(body["sos_count"], 1);
}

// ============ Port Listing Tests ============

#[tokio::test]
async fn test_list_ports_is_array() {
    let (status, body) = json_response(rest::list_ports().await).await;

    assert_eq!(status, 200);
    assert!(body.is_array());
}

// ============ Persistence Tests ============

#[tokio::test]
async fn test_sqlite_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hq.db");

    let store = Arc::new(SqliteStore::open(&path).await.unwrap());
    let state = test_state_with_store(store.clone());
    record(&state, "102a", MessageType::Sos, "SOS").await;
    store.close().await;

    let state = test_state_with_store(Arc::new(SqliteStore::open(&path).await.unwrap()));
    let (status, body) =
        json_response(rest::get_node(State(state.clone()), Path("102a".to_string())).await).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "sos");

    let (_, stats) = json_response(rest::get_stats(State(state)).await).await;
    assert_eq!(stats["sos_count"], 1);
}
