//! Events the bridge publishes to whatever transport sits outside it
//!
//! The reader task reports through an [`EventSink`]. Delivery is synchronous
//! and fire-and-forget: a sink with nobody listening drops the event.

use crate::message::MessageView;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// An event produced by the link or the recording path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LinkEvent {
    /// A frame was decoded and recorded
    NewMessage {
        /// The stored message with sender name and type label
        message: MessageView,
    },

    /// A node raised an emergency
    SosAlert {
        /// Node that sent the SOS
        node_id: NodeId,
        /// Its display name at alert time
        node_name: String,
        /// Message content
        content: String,
    },

    /// The serial link came up or went down
    Status {
        /// Whether a device link is active
        connected: bool,
    },
}

/// Receiver of bridge notifications
pub trait EventSink: Send + Sync {
    /// A message was recorded
    fn on_message(&self, message: &MessageView);

    /// An SOS message was recorded
    fn on_sos_alert(&self, node_id: &NodeId, node_name: &str, content: &str);

    /// The link connected or disconnected
    fn on_connection_status(&self, connected: bool);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_message(&self, _message: &MessageView) {}

    fn on_sos_alert(&self, _node_id: &NodeId, _node_name: &str, _content: &str) {}

    fn on_connection_status(&self, _connected: bool) {}
}
