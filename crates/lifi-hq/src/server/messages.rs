//! WebSocket message types

use lifi_core::{LinkEvent, MessageView, NodeId};
use lifi_link::Intent;
use serde::{Deserialize, Serialize};

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Whether a device link is active
    Status {
        connected: bool,
    },

    /// A message was received and recorded
    NewMessage {
        message: MessageView,
    },

    /// A node raised an emergency
    SosAlert {
        node_id: NodeId,
        node_name: String,
        content: String,
    },

    /// Reply to a connect or disconnect command
    DeviceStatus {
        status: DeviceStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to a send command
    SendResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Error message
    Error {
        message: String,
    },
}

impl From<LinkEvent> for WsMessage {
    fn from(event: LinkEvent) -> Self {
        match event {
            LinkEvent::NewMessage { message } => WsMessage::NewMessage { message },
            LinkEvent::SosAlert {
                node_id,
                node_name,
                content,
            } => WsMessage::SosAlert {
                node_id,
                node_name,
                content,
            },
            LinkEvent::Status { connected } => WsMessage::Status { connected },
        }
    }
}

/// Outcome of a device command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Connected,
    AlreadyConnected,
    Failed,
    Disconnected,
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Connect to the device, discovering the port when absent
    ConnectDevice {
        #[serde(default)]
        port: Option<String>,
    },

    /// Close the device link
    DisconnectDevice,

    /// Transmit a command through the device
    Send {
        intent: Intent,
    },
}
