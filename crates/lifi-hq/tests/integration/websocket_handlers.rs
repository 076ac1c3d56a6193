//! WebSocket command and event feed tests
//!
//! Commands go through `handle_client_message` the same way the socket
//! task runs them; events are read from the shared broadcast feed.

use lifi_core::{LinkEvent, NodeId, NodeStatus};
use lifi_hq::server::messages::{ClientMessage, DeviceStatus, WsMessage};
use lifi_hq::server::websocket::handle_client_message;
use lifi_link::test_utils::simulated_device;
use lifi_link::Intent;
use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast;

use super::test_state;

const WAIT: Duration = Duration::from_secs(2);

async fn next_event(rx: &mut broadcast::Receiver<LinkEvent>) -> WsMessage {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no event in time")
        .expect("event feed closed")
        .into()
}

fn client(value: serde_json::Value) -> ClientMessage {
    serde_json::from_value(value).unwrap()
}

// ============ Send Command Tests ============

#[tokio::test]
async fn test_send_without_device_fails() {
    let state = test_state();

    let reply = handle_client_message(
        client(json!({"type": "send", "intent": {"kind": "broadcast", "content": "hi"}})),
        &state,
    )
    .await;

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "send_result");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Not connected to a LiFi device");
}

#[tokio::test]
async fn test_send_reaches_device() {
    let state = test_state();
    let (mut device, host) = simulated_device();
    state.link.lock().await.attach(host, "sim0").await;

    let intents = [
        (
            json!({"kind": "broadcast", "content": "evacuate"}),
            "BROADCAST|evacuate\n",
        ),
        (
            json!({"kind": "targeted", "node_id": "102a", "content": "go"}),
            "TARGET|102a|go\n",
        ),
        (json!({"kind": "init", "id": "000h"}), "INIT|000h\n"),
    ];

    for (intent, wire) in intents {
        let reply =
            handle_client_message(client(json!({"type": "send", "intent": intent})), &state).await;
        assert_eq!(
            reply,
            WsMessage::SendResult {
                success: true,
                error: None
            }
        );
        assert_eq!(device.read_command_timeout(WAIT).await.unwrap(), wire);
    }
}

#[tokio::test]
async fn test_send_intent_variants_encode() {
    let intent = Intent::Message {
        node_id: NodeId::from("2b3c"),
        content: "status?".to_string(),
    };
    let json = serde_json::to_value(&intent).unwrap();
    assert_eq!(json["kind"], "message");

    let msg = client(json!({"type": "send", "intent": json}));
    assert!(matches!(msg, ClientMessage::Send { .. }));
}

// ============ Device Control Tests ============

#[tokio::test]
async fn test_connect_when_connected() {
    let state = test_state();
    let (_device, host) = simulated_device();
    state.link.lock().await.attach(host, "sim0").await;

    let reply = handle_client_message(client(json!({"type": "connect_device"})), &state).await;

    assert_eq!(
        reply,
        WsMessage::DeviceStatus {
            status: DeviceStatus::AlreadyConnected,
            port: Some("sim0".to_string()),
            error: None,
        }
    );
    assert!(state.link.lock().await.is_connected());
}

#[tokio::test]
async fn test_connect_to_missing_port_fails() {
    let state = test_state();
    let mut events = state.events.subscribe();

    let reply = handle_client_message(
        client(json!({"type": "connect_device", "port": "/dev/lifi-missing-port"})),
        &state,
    )
    .await;

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "device_status");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["port"], "/dev/lifi-missing-port");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("/dev/lifi-missing-port"));

    assert!(!state.link.lock().await.is_connected());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnect_before_connect() {
    let state = test_state();

    let reply = handle_client_message(client(json!({"type": "disconnect_device"})), &state).await;

    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"type": "device_status", "status": "disconnected"})
    );
}

#[tokio::test]
async fn test_disconnect_publishes_status() {
    let state = test_state();
    let (_device, host) = simulated_device();
    state.link.lock().await.attach(host, "sim0").await;
    let mut events = state.events.subscribe();

    handle_client_message(client(json!({"type": "disconnect_device"})), &state).await;

    assert_eq!(
        next_event(&mut events).await,
        WsMessage::Status { connected: false }
    );
    assert!(!state.link.lock().await.is_connected());
}

// ============ Event Feed Tests ============

#[tokio::test]
async fn test_device_lines_reach_event_feed() {
    let state = test_state();
    let mut events = state.events.subscribe();
    let (mut device, host) = simulated_device();
    state.link.lock().await.attach(host, "sim0").await;

    assert_eq!(
        next_event(&mut events).await,
        WsMessage::Status { connected: true }
    );

    device.emit_line("READY|v3").await.unwrap();
    device.emit_line("102a 3 HELP!").await.unwrap();

    let message = serde_json::to_value(next_event(&mut events).await).unwrap();
    assert_eq!(message["type"], "new_message");
    assert_eq!(message["message"]["sender_id"], "102a");
    assert_eq!(message["message"]["sender_name"], "Node 102a");
    assert_eq!(message["message"]["content"], "HELP!");
    assert_eq!(message["message"]["type_label"], "SOS");

    let alert = serde_json::to_value(next_event(&mut events).await).unwrap();
    assert_eq!(
        alert,
        json!({
            "type": "sos_alert",
            "node_id": "102a",
            "node_name": "Node 102a",
            "content": "HELP!"
        })
    );

    let node = state
        .store
        .get_node(&NodeId::from("102a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(node.status, NodeStatus::Sos);
}

#[tokio::test]
async fn test_every_subscriber_gets_events() {
    let state = test_state();
    let mut first = state.events.subscribe();
    let mut second = state.events.subscribe();
    let (mut device, host) = simulated_device();
    state.link.lock().await.attach(host, "sim0").await;

    device.emit_line("2b3c 4 all clear").await.unwrap();

    for rx in [&mut first, &mut second] {
        assert_eq!(next_event(rx).await, WsMessage::Status { connected: true });
        match next_event(rx).await {
            WsMessage::NewMessage { message } => {
                assert_eq!(message.record.content, "all clear")
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
