//! WebSocket connection handling

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use lifi_link::LinkError;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, error, info, warn};

use super::messages::{ClientMessage, DeviceStatus, WsMessage};
use crate::AppState;

/// Pending replies per client before the reader stops taking commands
const REPLY_BUFFER: usize = 32;

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("New WebSocket connection established");
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reporting status so nothing falls in between
    let mut event_rx = state.events.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::channel::<WsMessage>(REPLY_BUFFER);

    let connected = state.link.lock().await.is_connected();
    if send_json(&mut sender, &WsMessage::Status { connected }).await.is_err() {
        return;
    }

    // Forward link events and command replies to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                event = event_rx.recv() => match event {
                    Ok(event) => WsMessage::from(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagging, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };
            if send_json(&mut sender, &msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming commands from the client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    debug!("Received WebSocket text: {}", text);
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => handle_client_message(client_msg, &state).await,
                        Err(e) => {
                            warn!("Failed to parse client message: {} - raw: {}", e, text);
                            WsMessage::Error {
                                message: format!("Invalid message: {e}"),
                            }
                        }
                    };
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("WebSocket connection closed");
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &WsMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|e| {
        error!("Failed to serialize WebSocket message: {}", e);
    })?;
    sender.send(Message::Text(json)).await.map_err(|_| ())
}

/// Run one client command and build the reply for that client
///
/// Link events caused by the command (status changes, recorded messages)
/// reach every client through the event feed, not through this reply.
pub async fn handle_client_message(msg: ClientMessage, state: &AppState) -> WsMessage {
    match msg {
        ClientMessage::ConnectDevice { port } => {
            let mut link = state.link.lock().await;
            if link.is_connected() {
                return WsMessage::DeviceStatus {
                    status: DeviceStatus::AlreadyConnected,
                    port: link.port().map(str::to_string),
                    error: None,
                };
            }

            match link.connect(port.as_deref()).await {
                Ok(()) => {
                    info!(port = ?link.port(), "Device connected on request");
                    WsMessage::DeviceStatus {
                        status: DeviceStatus::Connected,
                        port: link.port().map(str::to_string),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "Device connect failed");
                    WsMessage::DeviceStatus {
                        status: DeviceStatus::Failed,
                        port,
                        error: Some(e.to_string()),
                    }
                }
            }
        }

        ClientMessage::DisconnectDevice => {
            state.link.lock().await.disconnect().await;
            WsMessage::DeviceStatus {
                status: DeviceStatus::Disconnected,
                port: None,
                error: None,
            }
        }

        ClientMessage::Send { intent } => {
            let link = state.link.lock().await;
            match link.send_intent(&intent).await {
                Ok(()) => WsMessage::SendResult {
                    success: true,
                    error: None,
                },
                Err(e) => {
                    if !matches!(e, LinkError::NotConnected) {
                        warn!(error = %e, retriable = e.is_retriable(), "Send to device failed");
                    }
                    WsMessage::SendResult {
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
    }
}
